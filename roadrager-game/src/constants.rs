//! Centralized balance and tuning constants for the Road Rager engine.
//!
//! These values define the deterministic math for the narrative engine.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Persistence ----------------------------------------------------------------
pub const STORAGE_KEY: &str = "roadRagerGameState";

// Opening --------------------------------------------------------------------
pub(crate) const START_LOCATION: &str = "apartment";
pub(crate) const INTRO_ENCOUNTER_ID: &str = "intro";
pub(crate) const START_DAY: u32 = 1;
pub(crate) const START_FUEL: i32 = 50;
pub(crate) const START_FOOD: i32 = 70;
pub(crate) const START_MEDICINE: i32 = 30;
pub(crate) const START_PARTS: i32 = 20;
pub(crate) const START_CAR_HEALTH: i32 = 80;

// Bounds ---------------------------------------------------------------------
pub(crate) const CAR_HEALTH_MIN: i32 = 0;
pub(crate) const CAR_HEALTH_MAX: i32 = 100;
pub(crate) const TRUST_MIN: i32 = -100;
pub(crate) const TRUST_MAX: i32 = 100;

// Daily consumption ----------------------------------------------------------
pub(crate) const DAILY_FOOD_COST: i32 = 10;
pub(crate) const DAILY_FUEL_COST: i32 = 5;

// Minigame reward divisors ---------------------------------------------------
pub(crate) const DRIVING_HEALTH_DIVISOR: u32 = 20;
pub(crate) const DRIVING_FAILURE_DAMAGE: i32 = 10;
pub(crate) const REPAIR_HEALTH_DIVISOR: u32 = 10;
pub(crate) const REPAIR_PARTS_DIVISOR: u32 = 50;
pub(crate) const REPAIR_FAILURE_PARTS: i32 = 3;
pub(crate) const SCAVENGE_FOOD_DIVISOR: u32 = 30;
pub(crate) const SCAVENGE_MEDICINE_DIVISOR: u32 = 40;
pub(crate) const SCAVENGE_PARTS_DIVISOR: u32 = 50;
pub(crate) const SCAVENGE_FUEL_DIVISOR: u32 = 60;

// Minigame fallback scores ---------------------------------------------------
pub(crate) const FALLBACK_SCORE_EASY: u32 = 60;
pub(crate) const FALLBACK_SCORE_MEDIUM: u32 = 40;
pub(crate) const FALLBACK_SCORE_HARD: u32 = 20;

// Presentation thresholds ----------------------------------------------------
pub(crate) const WARN_FOOD_THRESHOLD: i32 = 10;
pub(crate) const WARN_FUEL_THRESHOLD: i32 = 10;
pub(crate) const WARN_CAR_HEALTH_THRESHOLD: i32 = 20;
pub(crate) const TRUST_HOSTILE_BELOW: i32 = -50;
pub(crate) const TRUST_WARY_BELOW: i32 = 0;
pub(crate) const TRUST_NEUTRAL_BELOW: i32 = 25;
pub(crate) const TRUST_FRIENDLY_BELOW: i32 = 75;

// Bundled content --------------------------------------------------------------
pub(crate) const BUNDLED_CATALOG: &str = include_str!("../assets/data/catalog.json");
