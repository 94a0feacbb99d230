use thiserror::Error;

use crate::question::NumberRange;
use crate::records::Collection;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("invalid range [{min}, {max}] for {generator}")]
    InvalidRange {
        generator: &'static str,
        min: u32,
        max: u32,
    },

    #[error("{generator} gave up after {attempts} draws in [{min}, {max}]")]
    ResampleLimit {
        generator: &'static str,
        min: u32,
        max: u32,
        attempts: u32,
    },
}

impl GenerateError {
    pub(crate) fn invalid(generator: &'static str, range: NumberRange) -> Self {
        GenerateError::InvalidRange {
            generator,
            min: range.min,
            max: range.max,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: u64 },

    #[error("{collection} store unavailable: {reason}")]
    Unavailable {
        collection: Collection,
        reason: String,
    },

    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("unknown level {0}")]
    UnknownLevel(u32),

    #[error("level {0} is locked")]
    LevelLocked(u32),

    #[error("unknown skill '{0}'")]
    UnknownSkill(String),

    #[error("unknown time mode '{0}'")]
    UnknownTimeMode(String),

    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),

    #[error("unknown mistake filter '{0}'")]
    UnknownFilter(String),

    #[error("no question is being played")]
    NotPlaying,

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("no mistakes to review")]
    EmptyReview,

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
