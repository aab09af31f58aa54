//! Error types for configuration and entity setup
//!
//! Only configuration problems are errors. Perception misses, timeouts and
//! dead targets are ordinary state-machine inputs and never surface here.

use hecs::Entity;

use crate::ai::FsmError;
use crate::physics::CastError;

/// Invalid or unreadable static configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("invalid cast `{field}`: {source}")]
    InvalidCast {
        field: &'static str,
        source: CastError,
    },
    #[error("`{field}` must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("ability `{0}` has no casts")]
    NoCasts(String),
}

impl ConfigError {
    /// Check that `value` is finite and not below zero
    pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::Negative { field, value })
        }
    }

    /// Wrap a cast validation failure
    pub(crate) fn cast(field: &'static str, result: Result<(), CastError>) -> Result<(), Self> {
        result.map_err(|source| Self::InvalidCast { field, source })
    }
}

/// Errors that abort entity setup.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fsm(#[from] FsmError),
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Entity),
    #[error("entity {entity:?} is missing required component `{component}`")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
}
