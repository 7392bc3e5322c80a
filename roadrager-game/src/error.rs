use thiserror::Error;

use crate::result::Ending;

/// Caller sequencing errors raised by the mutating entry points.
///
/// Content authoring problems never surface here; they degrade to no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("game is over ({ending}); no further mutation is allowed")]
    GameOver { ending: Ending },
    #[error("unknown option '{option}'")]
    UnknownOption { option: String },
    #[error("unknown encounter '{encounter}'")]
    UnknownEncounter { encounter: String },
    #[error("option '{option}' is not offered by the current encounter ({presented})")]
    OptionNotPresented { option: String, presented: String },
    #[error("encounter '{encounter}' must finish its minigame before an option is chosen")]
    MinigamePending { encounter: String },
    #[error("encounter '{encounter}' has no minigame to start")]
    NoMinigame { encounter: String },
    #[error("no encounter is currently presented")]
    NoEncounter,
    #[error("unknown minigame session {0}")]
    UnknownMinigameSession(u64),
    #[error("unknown location '{location}'")]
    UnknownLocation { location: String },
    #[error("location '{location}' is not available")]
    LocationUnavailable { location: String },
}
