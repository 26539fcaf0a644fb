use thiserror::Error;

use crate::engine::EngineError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognized state code {0:?}")]
    UnknownState(String),

    #[error("{field} must be a finite, non-negative amount, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("{field} must be at most {limit}, got {value}")]
    AgeOutOfRange {
        field: &'static str,
        limit: u32,
        value: u32,
    },

    #[error("{unit} references unknown person {person:?}")]
    DanglingMember { unit: String, person: String },

    #[error("household membership must cover every person exactly once")]
    MembershipMismatch,

    #[error("income axis must contain at least one value")]
    EmptyAxis,

    #[error("engine computation failed for {variable:?}: {source}")]
    Engine {
        variable: String,
        #[source]
        source: EngineError,
    },

    #[error("grid evaluation did not finish within {timeout_ms} ms")]
    GridTimedOut { timeout_ms: u64 },

    #[error("serializing results: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures caused by the request itself rather than by the
    /// engine or the evaluation run.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(
            self,
            Error::Engine { .. } | Error::GridTimedOut { .. } | Error::Json(_)
        )
    }
}
