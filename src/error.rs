//! Error taxonomy
//!
//! Configuration and programming errors are fatal: they propagate out of the
//! frame loop, which stops. Storage errors are transient and left to the caller.

use thiserror::Error;

use crate::sim::entities::EntityKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("invalid level {0}")]
    InvalidLevel(usize),

    #[error("missing level params")]
    MissingLevelParams,

    #[error("missing HUD anchor `{0}`")]
    MissingHudAnchor(String),

    #[error("too many retries placing {kind:?} ({attempts} attempts)")]
    PlacementExhausted { kind: EntityKind, attempts: u32 },

    #[error("unsupported entity {0:?}")]
    UnsupportedEntity(EntityKind),

    #[error("storage error: {0}")]
    Storage(String),
}

impl GameError {
    /// Whether the frame loop must stop on this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GameError::Storage(_))
    }
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}
