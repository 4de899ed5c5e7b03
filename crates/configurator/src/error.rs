//! Configurator error model.

use thiserror::Error;

use storefront_auth::AccessError;

use crate::model::{OptionId, StepId};

/// Errors raised by model construction and session commands.
///
/// All of these are synchronous and local. A rejected command never
/// mutates the session; callers surface the error to the UI and move on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfiguratorError {
    /// The model definition itself is malformed (duplicate ids, dangling
    /// references, degenerate limits).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("unknown step '{0}'")]
    UnknownStep(StepId),

    /// The step exists but its dependency is not satisfied by the
    /// current selections.
    #[error("step '{0}' is not available for the current selections")]
    StepUnavailable(StepId),

    /// The option is not in the step's currently available option set.
    #[error("invalid option '{option}' for step '{step}'")]
    InvalidOption { step: StepId, option: OptionId },

    /// The selection value shape does not match the step kind.
    #[error("step '{step}' expects a {expected} selection")]
    SelectionKind {
        step: StepId,
        expected: &'static str,
    },

    #[error("quantity {amount} for step '{step}' is outside {min}..={max}")]
    QuantityOutOfRange {
        step: StepId,
        amount: u32,
        min: u32,
        max: u32,
    },

    #[error("quantity {amount} for step '{step}' must land on multiples of {step_size} from the minimum")]
    QuantityMisaligned {
        step: StepId,
        amount: u32,
        step_size: u32,
    },

    /// Finalization needs every required step recorded.
    #[error("configuration is incomplete")]
    Incomplete,

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl ConfiguratorError {
    pub fn invalid_model(msg: impl Into<String>) -> Self {
        Self::InvalidModel(msg.into())
    }
}
