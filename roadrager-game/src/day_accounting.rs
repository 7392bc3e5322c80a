//! Day advancement and survival checks run on travel.
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::effects::ensure_running;
use crate::error::EngineError;
use crate::result::Ending;
use crate::state::WorldState;

/// Result of one travel step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TravelOutcome {
    Advanced {
        day: u32,
        location: String,
        food: i32,
        fuel: i32,
    },
    Ended {
        ending: Ending,
    },
}

impl TravelOutcome {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}

/// Consume a day's food and fuel, then check survival in fixed priority:
/// starvation, then stranding, then breakdown.
///
/// Travelling without a destination counts as leaving the current location
/// for the stranding check.
///
/// # Errors
///
/// Returns [`EngineError::GameOver`] without touching the state when the game
/// has already ended.
pub fn advance_day(
    state: &mut WorldState,
    destination: Option<&str>,
    config: &EngineConfig,
) -> Result<TravelOutcome, EngineError> {
    ensure_running(state)?;

    let new_food = state
        .resources
        .food
        .saturating_sub(config.daily_food_cost)
        .max(0);
    let new_fuel = state
        .resources
        .fuel
        .saturating_sub(config.daily_fuel_cost)
        .max(0);
    let stays_put = destination == Some(state.location.as_str());

    let ending = if new_food == 0 {
        state.resources.food = 0;
        Some(Ending::Starvation)
    } else if new_fuel == 0 && !stays_put {
        state.resources.fuel = 0;
        Some(Ending::Stranded)
    } else if state.car_health <= 0 {
        Some(Ending::Breakdown)
    } else {
        None
    };

    if let Some(ending) = ending {
        info!("travel on day {} ended the run: {ending}", state.day);
        state.trigger_ending(ending.clone());
        return Ok(TravelOutcome::Ended { ending });
    }

    state.day = state.day.saturating_add(1);
    if let Some(destination) = destination {
        state.location = destination.to_string();
    }
    state.resources.food = new_food;
    state.resources.fuel = new_fuel;
    debug!(
        "travelled to '{}' on day {} (food {}, fuel {})",
        state.location, state.day, new_food, new_fuel
    );
    Ok(TravelOutcome::Advanced {
        day: state.day,
        location: state.location.clone(),
        food: new_food,
        fuel: new_fuel,
    })
}
