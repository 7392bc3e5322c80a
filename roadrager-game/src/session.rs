//! Game session facade: the three mutating entry points plus reset.
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::GameStorage;
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::data::Encounter;
use crate::day_accounting::{TravelOutcome, advance_day};
use crate::effects::{ChoiceOutcome, StateDelta, apply_delta, apply_option, ensure_running};
use crate::encounters::{EncounterPick, EncounterRequest, pick_encounter};
use crate::error::EngineError;
use crate::locations::{LocationChoice, available_locations};
use crate::minigame::{
    MinigameDescriptor, MinigameResult, MinigameSession, MinigameSignal, SettledMinigame,
};
use crate::result::{EndingSummary, ResourceWarning, ending_summary};
use crate::state::WorldState;

/// Handle given to the minigame collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinigameTicket {
    pub session_id: u64,
    pub encounter_id: String,
    pub descriptor: MinigameDescriptor,
}

/// What folding a minigame result changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinigameReport {
    pub session_id: u64,
    pub encounter_id: String,
    pub result: MinigameResult,
    pub delta: StateDelta,
    pub via_fallback: bool,
    /// The encounter completed without an option step.
    pub auto_completed: bool,
}

/// A running game bound to a catalog, configuration and storage slot.
pub struct GameSession<S: GameStorage> {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    storage: S,
    state: WorldState,
    minigame: Option<MinigameSession>,
    minigame_cleared: Option<String>,
    next_minigame_id: u64,
}

impl<S: GameStorage> GameSession<S> {
    /// Open a session, restoring the persisted slot when it holds a valid state.
    ///
    /// Missing or corrupt saves fall back to the opening snapshot.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, storage: S) -> Self {
        let state = match storage.load_state(&config.storage_key) {
            Ok(Some(state)) => {
                info!(
                    "restored saved game from '{}' (day {})",
                    config.storage_key, state.day
                );
                state
            }
            Ok(None) => {
                debug!("no saved game in '{}'", config.storage_key);
                WorldState::initial(&config)
            }
            Err(err) => {
                warn!("discarding unreadable save: {err}");
                WorldState::initial(&config)
            }
        };
        Self::from_state(catalog, config, storage, state)
    }

    /// Build a session around an existing state without reading storage.
    ///
    /// Out-of-range car health or trust is clamped on the way in.
    #[must_use]
    pub fn from_state(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        storage: S,
        mut state: WorldState,
    ) -> Self {
        if state.normalize() {
            warn!("restored state held out-of-range values; clamped");
        }
        Self {
            catalog,
            config,
            storage,
            state,
            minigame: None,
            minigame_cleared: None,
            next_minigame_id: 1,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn into_state(self) -> WorldState {
        self.state
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.state.game_over
    }

    /// Encounter to present and the rule that selected it.
    #[must_use]
    pub fn current_pick(&self) -> Option<EncounterPick<'_>> {
        if self.state.game_over {
            return None;
        }
        let request = EncounterRequest::from_state(&self.state, &self.catalog, &self.config);
        pick_encounter(&request)
    }

    /// Encounter to present, or `None` when the player must travel.
    #[must_use]
    pub fn current_encounter(&self) -> Option<&Encounter> {
        self.current_pick().map(|pick| pick.encounter)
    }

    /// Whether the presented encounter still waits for its minigame.
    #[must_use]
    pub fn minigame_pending(&self) -> bool {
        self.current_encounter()
            .is_some_and(|encounter| self.needs_minigame(encounter))
    }

    fn needs_minigame(&self, encounter: &Encounter) -> bool {
        encounter.has_minigame() && self.minigame_cleared.as_deref() != Some(encounter.id.as_str())
    }

    #[must_use]
    pub fn active_minigame(&self) -> Option<&MinigameSession> {
        self.minigame.as_ref()
    }

    #[must_use]
    pub fn available_locations(&self) -> Vec<LocationChoice> {
        available_locations(&self.catalog, &self.state)
    }

    #[must_use]
    pub fn ending_summary(&self) -> Option<EndingSummary> {
        ending_summary(&self.state)
    }

    #[must_use]
    pub const fn resource_warning(&self) -> Option<ResourceWarning> {
        ResourceWarning::check(&self.state)
    }

    fn guard_running(&self) -> Result<(), EngineError> {
        ensure_running(&self.state).inspect_err(|err| error!("{err}"))
    }

    fn reject(err: EngineError) -> EngineError {
        error!("{err}");
        err
    }

    fn persist(&self) {
        if let Err(err) = self
            .storage
            .save_state(&self.config.storage_key, &self.state)
        {
            error!(
                "failed to persist game state to '{}': {err}",
                self.config.storage_key
            );
        }
    }

    /// Apply an option of the presented encounter.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over, the option is unknown or not
    /// offered by the presented encounter, or the encounter's minigame has not
    /// been played yet.
    pub fn choose_option(&mut self, option_id: &str) -> Result<ChoiceOutcome, EngineError> {
        self.guard_running()?;
        let catalog = Arc::clone(&self.catalog);
        let (Some(option), Some(owner)) =
            (catalog.option(option_id), catalog.option_owner(option_id))
        else {
            return Err(Self::reject(EngineError::UnknownOption {
                option: option_id.to_string(),
            }));
        };
        let Some(presented) = self.current_encounter() else {
            return Err(Self::reject(EngineError::NoEncounter));
        };
        if presented.id != owner.id {
            return Err(Self::reject(EngineError::OptionNotPresented {
                option: option_id.to_string(),
                presented: presented.id.clone(),
            }));
        }
        if self.needs_minigame(owner) {
            return Err(Self::reject(EngineError::MinigamePending {
                encounter: owner.id.clone(),
            }));
        }

        let outcome = apply_option(&mut self.state, &catalog, owner, option)?;
        self.minigame = None;
        self.minigame_cleared = None;
        self.persist();
        Ok(outcome)
    }

    /// Start the minigame embedded in the presented encounter.
    ///
    /// Starting again abandons the previous session without applying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over, nothing is presented, or the
    /// presented encounter has no pending minigame.
    pub fn start_minigame(&mut self) -> Result<MinigameTicket, EngineError> {
        self.guard_running()?;
        let Some(encounter) = self.current_encounter() else {
            return Err(Self::reject(EngineError::NoEncounter));
        };
        let encounter_id = encounter.id.clone();
        let descriptor = match encounter.minigame {
            Some(descriptor) if self.needs_minigame(encounter) => descriptor,
            _ => {
                return Err(Self::reject(EngineError::NoMinigame {
                    encounter: encounter_id,
                }));
            }
        };
        if let Some(previous) = &self.minigame
            && !previous.is_settled()
        {
            warn!(
                "abandoning minigame session {} for '{}'",
                previous.id(),
                previous.encounter_id()
            );
        }

        let session_id = self.next_minigame_id;
        self.next_minigame_id += 1;
        self.minigame = Some(MinigameSession::new(
            session_id,
            encounter_id.clone(),
            descriptor,
            &self.config.fallback_scores,
        ));
        debug!("minigame {session_id} ({}) started for '{encounter_id}'", descriptor.kind);
        Ok(MinigameTicket {
            session_id,
            encounter_id,
            descriptor,
        })
    }

    /// Fold a normal minigame completion into the world state.
    ///
    /// Returns `Ok(None)` when the session was already settled or superseded.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over or the session id was never issued.
    pub fn complete_minigame(
        &mut self,
        session_id: u64,
        success: bool,
        score: u32,
    ) -> Result<Option<MinigameReport>, EngineError> {
        self.settle_minigame(
            session_id,
            MinigameSignal::Completed(MinigameResult { success, score }),
        )
    }

    /// Settle a minigame whose surface was lost, using the difficulty fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over or the session id was never issued.
    pub fn abort_minigame(
        &mut self,
        session_id: u64,
    ) -> Result<Option<MinigameReport>, EngineError> {
        self.settle_minigame(session_id, MinigameSignal::Fallback)
    }

    fn settle_minigame(
        &mut self,
        session_id: u64,
        signal: MinigameSignal,
    ) -> Result<Option<MinigameReport>, EngineError> {
        self.guard_running()?;
        if session_id == 0 || session_id >= self.next_minigame_id {
            return Err(Self::reject(EngineError::UnknownMinigameSession(session_id)));
        }
        let Some(session) = self.minigame.as_mut().filter(|s| s.id() == session_id) else {
            warn!("minigame session {session_id} is no longer active; ignoring {signal:?}");
            return Ok(None);
        };
        let Some(SettledMinigame {
            result,
            delta,
            via_fallback,
        }) = session.settle(signal)
        else {
            return Ok(None);
        };
        let encounter_id = session.encounter_id().to_string();

        apply_delta(&mut self.state, delta);
        let auto_completed = self
            .catalog
            .encounter(&encounter_id)
            .is_some_and(|encounter| encounter.auto_progress_after_minigame);
        if auto_completed {
            self.state.complete_encounter(&encounter_id);
            self.minigame_cleared = None;
        } else {
            self.minigame_cleared = Some(encounter_id.clone());
        }
        self.persist();

        Ok(Some(MinigameReport {
            session_id,
            encounter_id,
            result,
            delta,
            via_fallback,
            auto_completed,
        }))
    }

    /// Travel to a destination, or rest in place when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the game is over or the destination is unknown or
    /// not yet available.
    pub fn travel(&mut self, destination: Option<&str>) -> Result<TravelOutcome, EngineError> {
        self.guard_running()?;
        if let Some(destination) = destination
            && destination != self.state.location
            && !self.catalog.locations().is_empty()
        {
            let Some(location) = self.catalog.location(destination) else {
                return Err(Self::reject(EngineError::UnknownLocation {
                    location: destination.to_string(),
                }));
            };
            if !location.availability.holds(&self.state) {
                return Err(Self::reject(EngineError::LocationUnavailable {
                    location: destination.to_string(),
                }));
            }
        }

        let outcome = advance_day(&mut self.state, destination, &self.config)?;
        self.minigame = None;
        self.minigame_cleared = None;
        self.persist();
        Ok(outcome)
    }

    /// Restore the opening snapshot and persist it.
    pub fn reset(&mut self) -> &WorldState {
        self.state = WorldState::initial(&self.config);
        self.minigame = None;
        self.minigame_cleared = None;
        self.persist();
        info!("game reset to day {}", self.state.day);
        &self.state
    }
}
