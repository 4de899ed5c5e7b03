//! Configurator session aggregate.
//!
//! The session owns a validated [`ConfiguratorModel`] and the shopper's
//! in-progress [`Configuration`]. Commands validate purely in `handle`;
//! `apply` folds the emitted events into state, so a rejected command
//! leaves the session observably identical.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_auth::{CurrentUser, require_authenticated};
use storefront_core::{Aggregate, AggregateRoot, ConfigurationId, Event, UserId};

use crate::error::ConfiguratorError;
use crate::model::{ConfiguratorModel, OptionId, StepDef, StepId, StepKind, StepOption};
use crate::pricing;

/// Value recorded for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionValue {
    /// Exactly one option of a single-select step.
    Single(OptionId),
    /// Any subset of a multi-select step's options, possibly empty.
    Multi(BTreeSet<OptionId>),
    /// Amount recorded on a quantity step.
    Quantity(u32),
}

/// One recorded (step, value) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    pub step: StepId,
    pub value: SelectionValue,
}

/// The selections recorded so far, kept in model step order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    entries: Vec<ConfigurationEntry>,
}

impl Configuration {
    pub fn get(&self, step: &StepId) -> Option<&SelectionValue> {
        self.entries
            .iter()
            .find(|entry| &entry.step == step)
            .map(|entry| &entry.value)
    }

    pub fn entries(&self) -> &[ConfigurationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set(&mut self, step: StepId, value: SelectionValue) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.step == step) {
            entry.value = value;
        } else {
            self.entries.push(ConfigurationEntry { step, value });
        }
    }

    pub(crate) fn remove(&mut self, step: &StepId) {
        self.entries.retain(|entry| &entry.step != step);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn sort_by_position<F>(&mut self, mut position: F)
    where
        F: FnMut(&StepId) -> usize,
    {
        self.entries.sort_by_key(|entry| position(&entry.step));
    }
}

/// Command: record a selection for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub step: StepId,
    pub value: SelectionValue,
    pub occurred_at: DateTime<Utc>,
}

/// Command: clear one step's recorded selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearStep {
    pub step: StepId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: drop every recorded selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfiguration {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    SelectOption(SelectOption),
    ClearStep(ClearStep),
    ResetConfiguration(ResetConfiguration),
}

/// Event: a selection was recorded for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRecorded {
    pub step: StepId,
    pub value: SelectionValue,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a step's recorded selection was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCleared {
    pub step: StepId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: the whole configuration was reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationReset {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    SelectionRecorded(SelectionRecorded),
    SelectionCleared(SelectionCleared),
    ConfigurationReset(ConfigurationReset),
}

impl Event for SessionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SelectionRecorded(_) => "configurator.selection.recorded",
            SessionEvent::SelectionCleared(_) => "configurator.selection.cleared",
            SessionEvent::ConfigurationReset(_) => "configurator.configuration.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::SelectionRecorded(e) => e.occurred_at,
            SessionEvent::SelectionCleared(e) => e.occurred_at,
            SessionEvent::ConfigurationReset(e) => e.occurred_at,
        }
    }
}

/// One line of a finalized configuration, with the display label and
/// price resolved at finalization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationLine {
    pub step: StepId,
    pub label: String,
    pub selection: SelectionValue,
    pub price: u64,
}

/// Serializable hand-off to the cart/order system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedConfiguration {
    pub id: ConfigurationId,
    pub model_key: String,
    pub user: UserId,
    pub lines: Vec<ConfigurationLine>,
    pub sku: String,
    pub total_price: u64,
    pub finalized_at: DateTime<Utc>,
}

/// Aggregate root: one shopper's in-progress configuration of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorSession {
    id: ConfigurationId,
    model: ConfiguratorModel,
    configuration: Configuration,
    version: u64,
}

impl ConfiguratorSession {
    /// Start a fresh session over a validated model.
    pub fn start(id: ConfigurationId, model: ConfiguratorModel) -> Self {
        Self {
            id,
            model,
            configuration: Configuration::default(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> ConfigurationId {
        self.id
    }

    pub fn model(&self) -> &ConfiguratorModel {
        &self.model
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Validate and apply in one call. On error the session is untouched.
    pub fn execute(&mut self, command: &SessionCommand) -> Result<Vec<SessionEvent>, ConfiguratorError> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    pub fn select_option(
        &mut self,
        step: StepId,
        value: SelectionValue,
        at: DateTime<Utc>,
    ) -> Result<Vec<SessionEvent>, ConfiguratorError> {
        self.execute(&SessionCommand::SelectOption(SelectOption {
            step,
            value,
            occurred_at: at,
        }))
    }

    /// The options currently selectable for a step, honoring dependency
    /// gating and every compatibility rule triggered by earlier
    /// selections (triggered rules intersect). Unreachable steps yield an
    /// empty set; pure, callable at any point.
    pub fn available_options(&self, step_id: &StepId) -> Result<Vec<&StepOption>, ConfiguratorError> {
        let step = self
            .model
            .step(step_id)
            .ok_or_else(|| ConfiguratorError::UnknownStep(step_id.clone()))?;
        if !self.dependency_met(step) {
            return Ok(Vec::new());
        }

        let mut allowed: Option<BTreeSet<&OptionId>> = None;
        for rule in self.model.compatibility() {
            if &rule.then_step != step_id {
                continue;
            }
            let triggered = self
                .single_choice(&rule.when_step)
                .is_some_and(|chosen| chosen == &rule.when_option);
            if !triggered {
                continue;
            }
            let rule_set: BTreeSet<&OptionId> = rule.allowed.iter().collect();
            allowed = Some(match allowed {
                None => rule_set,
                Some(current) => current.intersection(&rule_set).copied().collect(),
            });
        }

        Ok(step
            .options()
            .iter()
            .filter(|option| {
                allowed
                    .as_ref()
                    .map_or(true, |set| set.contains(option.id()))
            })
            .collect())
    }

    /// True when every required, currently reachable step has a recorded
    /// selection. A recorded empty multi-select counts as answered.
    pub fn is_complete(&self) -> bool {
        self.model
            .steps()
            .iter()
            .filter(|step| step.is_required() && self.dependency_met(step))
            .all(|step| self.configuration.get(step.id()).is_some())
    }

    /// Total in minor currency units: base charges plus each recorded
    /// line, with per-unit rules multiplying the priced option.
    pub fn total_price(&self) -> u64 {
        pricing::total_price(&self.model, &self.configuration)
    }

    /// `Some` once the configuration is complete.
    pub fn generated_sku(&self) -> Option<String> {
        self.is_complete()
            .then(|| pricing::assemble_sku(&self.model, &self.configuration))
    }

    /// Resolve the configuration into the cart hand-off record. Requires
    /// an authenticated user and a complete configuration.
    pub fn finalize(
        &self,
        user: &CurrentUser,
        at: DateTime<Utc>,
    ) -> Result<FinalizedConfiguration, ConfiguratorError> {
        let user_id = require_authenticated(user)?;
        if !self.is_complete() {
            return Err(ConfiguratorError::Incomplete);
        }

        let mut lines = Vec::with_capacity(self.configuration.len());
        for entry in self.configuration.entries() {
            let Some(step) = self.model.step(&entry.step) else {
                continue;
            };
            let label = match &entry.value {
                SelectionValue::Single(option_id) => step
                    .option(option_id)
                    .map_or_else(|| option_id.to_string(), |option| option.name().to_string()),
                SelectionValue::Multi(options) => options
                    .iter()
                    .map(|id| {
                        step.option(id)
                            .map_or_else(|| id.to_string(), |option| option.name().to_string())
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                SelectionValue::Quantity(amount) => match step.kind() {
                    StepKind::Quantity { limits } => format!("{amount} {}", limits.unit()),
                    _ => amount.to_string(),
                },
            };
            lines.push(ConfigurationLine {
                step: entry.step.clone(),
                label,
                selection: entry.value.clone(),
                price: pricing::line_price(&self.model, &self.configuration, entry),
            });
        }

        Ok(FinalizedConfiguration {
            id: self.id,
            model_key: self.model.key().to_string(),
            user: user_id,
            lines,
            sku: pricing::assemble_sku(&self.model, &self.configuration),
            total_price: self.total_price(),
            finalized_at: at,
        })
    }

    fn handle_select(&self, cmd: &SelectOption) -> Result<Vec<SessionEvent>, ConfiguratorError> {
        let step = self
            .model
            .step(&cmd.step)
            .ok_or_else(|| ConfiguratorError::UnknownStep(cmd.step.clone()))?;
        if !self.dependency_met(step) {
            return Err(ConfiguratorError::StepUnavailable(cmd.step.clone()));
        }

        match (step.kind(), &cmd.value) {
            (StepKind::Select { .. }, SelectionValue::Single(option)) => {
                self.ensure_available(&cmd.step, option)?;
            }
            (StepKind::MultiSelect { .. }, SelectionValue::Multi(options)) => {
                for option in options {
                    self.ensure_available(&cmd.step, option)?;
                }
            }
            (StepKind::Quantity { limits }, SelectionValue::Quantity(amount)) => {
                if *amount < limits.min() || *amount > limits.max() {
                    return Err(ConfiguratorError::QuantityOutOfRange {
                        step: cmd.step.clone(),
                        amount: *amount,
                        min: limits.min(),
                        max: limits.max(),
                    });
                }
                if !limits.allows(*amount) {
                    return Err(ConfiguratorError::QuantityMisaligned {
                        step: cmd.step.clone(),
                        amount: *amount,
                        step_size: limits.step(),
                    });
                }
            }
            (kind, _) => {
                return Err(ConfiguratorError::SelectionKind {
                    step: cmd.step.clone(),
                    expected: expected_shape(kind),
                });
            }
        }

        let mut events = vec![SessionEvent::SelectionRecorded(SelectionRecorded {
            step: cmd.step.clone(),
            value: cmd.value.clone(),
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.invalidated_after(&cmd.step, cmd.occurred_at));
        Ok(events)
    }

    fn handle_clear(&self, cmd: &ClearStep) -> Result<Vec<SessionEvent>, ConfiguratorError> {
        if self.model.step(&cmd.step).is_none() {
            return Err(ConfiguratorError::UnknownStep(cmd.step.clone()));
        }
        if self.configuration.get(&cmd.step).is_none() {
            return Ok(Vec::new());
        }
        let mut events = vec![SessionEvent::SelectionCleared(SelectionCleared {
            step: cmd.step.clone(),
            occurred_at: cmd.occurred_at,
        })];
        events.extend(self.invalidated_after(&cmd.step, cmd.occurred_at));
        Ok(events)
    }

    fn handle_reset(&self, cmd: &ResetConfiguration) -> Result<Vec<SessionEvent>, ConfiguratorError> {
        if self.configuration.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![SessionEvent::ConfigurationReset(ConfigurationReset {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn ensure_available(&self, step: &StepId, option: &OptionId) -> Result<(), ConfiguratorError> {
        let available = self.available_options(step)?;
        if available.iter().any(|candidate| candidate.id() == option) {
            Ok(())
        } else {
            Err(ConfiguratorError::InvalidOption {
                step: step.clone(),
                option: option.clone(),
            })
        }
    }

    /// Changing an earlier step invalidates every later recorded step,
    /// even when the value is re-selected unchanged.
    fn invalidated_after(&self, step: &StepId, occurred_at: DateTime<Utc>) -> Vec<SessionEvent> {
        let Some(position) = self.model.step_position(step) else {
            return Vec::new();
        };
        self.model.steps()[position + 1..]
            .iter()
            .filter(|later| self.configuration.get(later.id()).is_some())
            .map(|later| {
                SessionEvent::SelectionCleared(SelectionCleared {
                    step: later.id().clone(),
                    occurred_at,
                })
            })
            .collect()
    }

    fn dependency_met(&self, step: &StepDef) -> bool {
        step.depends_on().map_or(true, |dependency| {
            self.single_choice(&dependency.step)
                .is_some_and(|chosen| dependency.values.contains(chosen))
        })
    }

    fn single_choice(&self, step: &StepId) -> Option<&OptionId> {
        match self.configuration.get(step) {
            Some(SelectionValue::Single(option)) => Some(option),
            _ => None,
        }
    }
}

fn expected_shape(kind: &StepKind) -> &'static str {
    match kind {
        StepKind::Select { .. } => "single option",
        StepKind::MultiSelect { .. } => "option set",
        StepKind::Quantity { .. } => "quantity",
    }
}

impl AggregateRoot for ConfiguratorSession {
    type Id = ConfigurationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for ConfiguratorSession {
    type Command = SessionCommand;
    type Event = SessionEvent;
    type Error = ConfiguratorError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SessionEvent::SelectionRecorded(e) => {
                self.configuration.set(e.step.clone(), e.value.clone());
                let model = &self.model;
                self.configuration
                    .sort_by_position(|step| model.step_position(step).unwrap_or(usize::MAX));
            }
            SessionEvent::SelectionCleared(e) => {
                self.configuration.remove(&e.step);
            }
            SessionEvent::ConfigurationReset(_) => {
                self.configuration.clear();
            }
        }
        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SessionCommand::SelectOption(cmd) => self.handle_select(cmd),
            SessionCommand::ClearStep(cmd) => self.handle_clear(cmd),
            SessionCommand::ResetConfiguration(cmd) => self.handle_reset(cmd),
        }
    }
}
