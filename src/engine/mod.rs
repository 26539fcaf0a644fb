mod stylized;

pub use stylized::StylizedEngine;

use thiserror::Error;

use crate::core::Situation;

/// Failure raised by a calculation engine for one variable request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The tax/benefit calculation engine consumed by this crate.
///
/// An engine is a pure function of the situation document, the tax year and
/// the requested variable. It returns one value per instance of the
/// variable's entity: a single-element array for household, tax-unit and
/// SPM-unit variables, and one element per person for person-level
/// variables. NaN entries are legal and mean "not applicable"; the caller
/// coerces them to zero. Implementations must tolerate concurrent
/// independent invocations.
pub trait CalculationEngine: Send + Sync {
    fn calculate(
        &self,
        situation: &Situation,
        year: u16,
        variable: &str,
    ) -> std::result::Result<Vec<f64>, EngineError>;
}
