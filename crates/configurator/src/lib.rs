//! Guided-selling configurator domain module.
//!
//! A validated [`ConfiguratorModel`] describes steps, options and rules;
//! a [`ConfiguratorSession`] walks a shopper through it as an
//! event-sourced aggregate. Pure domain logic throughout (no IO, no
//! HTTP, no storage).

pub mod error;
pub mod model;
mod pricing;
pub mod session;

pub use error::ConfiguratorError;
pub use model::{
    CompatibilityRule, ConfiguratorModel, OptionId, PricingRule, QuantityLimits, StepDef,
    StepDependency, StepId, StepKind, StepOption,
};
pub use session::{
    ClearStep, Configuration, ConfigurationEntry, ConfigurationLine, ConfigurationReset,
    ConfiguratorSession, FinalizedConfiguration, ResetConfiguration, SelectOption,
    SelectionCleared, SelectionRecorded, SelectionValue, SessionCommand, SessionEvent,
};
