//! Static configurator model: steps, options, rules.
//!
//! A [`ConfiguratorModel`] is authored once (typically deserialized from
//! the merchandising backend) and validated on construction, so the
//! session layer can assume every reference inside it resolves.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

use crate::error::ConfiguratorError;

/// Identifier of a configuration step. Lowercase slug, stable across
/// model revisions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

/// Identifier of a selectable option within a step. Lowercase slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionId(String);

macro_rules! impl_slug_id {
    ($type:ty, $what:literal) => {
        impl $type {
            pub fn new(id: impl Into<String>) -> DomainResult<Self> {
                Ok(Self(validate_slug(id.into(), $what)?))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $type {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $type {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_slug_id!(StepId, "step id");
impl_slug_id!(OptionId, "option id");

fn validate_slug(raw: String, what: &str) -> DomainResult<String> {
    let slug = raw.trim().to_lowercase();
    if slug.is_empty() {
        return Err(DomainError::invalid_id(format!("{what} cannot be empty")));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::invalid_id(format!(
            "{what} '{slug}' must be alphanumeric with dashes"
        )));
    }
    Ok(slug)
}

/// Bounds for a quantity step: an integral amount of `unit`, between
/// `min` and `max`, in increments of `step` starting at `min`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityLimits {
    min: u32,
    max: u32,
    step: u32,
    unit: String,
}

impl QuantityLimits {
    pub fn new(min: u32, max: u32, step: u32, unit: impl Into<String>) -> Result<Self, ConfiguratorError> {
        if step == 0 {
            return Err(ConfiguratorError::invalid_model(
                "quantity step size must be at least 1",
            ));
        }
        if min > max {
            return Err(ConfiguratorError::invalid_model(
                "quantity minimum exceeds maximum",
            ));
        }
        let unit = unit.into().trim().to_string();
        if unit.is_empty() {
            return Err(ConfiguratorError::invalid_model(
                "quantity unit cannot be empty",
            ));
        }
        Ok(Self {
            min,
            max,
            step,
            unit,
        })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// True when `amount` is within bounds and on the step grid.
    pub fn allows(&self, amount: u32) -> bool {
        amount >= self.min && amount <= self.max && (amount - self.min) % self.step == 0
    }
}

/// One selectable option of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOption {
    id: OptionId,
    name: String,
    price: u64,
    sku_fragment: Option<String>,
    details: BTreeMap<String, String>,
}

impl StepOption {
    /// `price` is in minor currency units (cents).
    pub fn new(id: OptionId, name: impl Into<String>, price: u64) -> Result<Self, ConfiguratorError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfiguratorError::invalid_model(format!(
                "option '{id}' needs a display name"
            )));
        }
        Ok(Self {
            id,
            name,
            price,
            sku_fragment: None,
            details: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn with_sku_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.sku_fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &OptionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn sku_fragment(&self) -> Option<&str> {
        self.sku_fragment.as_deref()
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }
}

/// What kind of answer a step records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    /// Exactly one option.
    Select { options: Vec<StepOption> },
    /// Any subset of the options, including none.
    MultiSelect { options: Vec<StepOption> },
    /// An integral amount within declared limits.
    Quantity { limits: QuantityLimits },
}

/// Gate on a whole step: it only becomes available once the named
/// earlier single-select step has one of `values` recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDependency {
    pub step: StepId,
    pub values: BTreeSet<OptionId>,
}

impl StepDependency {
    pub fn new(step: StepId, values: impl IntoIterator<Item = OptionId>) -> Self {
        Self {
            step,
            values: values.into_iter().collect(),
        }
    }
}

/// One configuration step. Steps are answered in model order; changing
/// an earlier answer invalidates everything after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDef {
    id: StepId,
    name: String,
    kind: StepKind,
    required: bool,
    depends_on: Option<StepDependency>,
}

impl StepDef {
    /// Steps are required by default; see [`StepDef::optional`].
    pub fn new(id: StepId, name: impl Into<String>, kind: StepKind) -> Result<Self, ConfiguratorError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfiguratorError::invalid_model(format!(
                "step '{id}' needs a display name"
            )));
        }
        match &kind {
            StepKind::Select { options } | StepKind::MultiSelect { options } => {
                if options.is_empty() {
                    return Err(ConfiguratorError::invalid_model(format!(
                        "step '{id}' needs at least one option"
                    )));
                }
                let mut seen = BTreeSet::new();
                for option in options {
                    if !seen.insert(option.id().clone()) {
                        return Err(ConfiguratorError::invalid_model(format!(
                            "step '{id}' has duplicate option '{}'",
                            option.id()
                        )));
                    }
                }
            }
            StepKind::Quantity { .. } => {}
        }
        Ok(Self {
            id,
            name,
            kind,
            required: true,
            depends_on: None,
        })
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, dependency: StepDependency) -> Self {
        self.depends_on = Some(dependency);
        self
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn depends_on(&self) -> Option<&StepDependency> {
        self.depends_on.as_ref()
    }

    /// The step's unconditional option set; empty for quantity steps.
    pub fn options(&self) -> &[StepOption] {
        match &self.kind {
            StepKind::Select { options } | StepKind::MultiSelect { options } => options,
            StepKind::Quantity { .. } => &[],
        }
    }

    pub fn option(&self, id: &OptionId) -> Option<&StepOption> {
        self.options().iter().find(|option| option.id() == id)
    }
}

/// When `when_step` has `when_option` recorded, restrict `then_step` to
/// the `allowed` options. Several triggered rules intersect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub when_step: StepId,
    pub when_option: OptionId,
    pub then_step: StepId,
    pub allowed: BTreeSet<OptionId>,
}

impl CompatibilityRule {
    pub fn new(
        when_step: StepId,
        when_option: OptionId,
        then_step: StepId,
        allowed: impl IntoIterator<Item = OptionId>,
    ) -> Self {
        Self {
            when_step,
            when_option,
            then_step,
            allowed: allowed.into_iter().collect(),
        }
    }
}

/// How a model charges for a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingRule {
    /// Flat charge added to every configuration of this model.
    Base { amount: u64 },
    /// The priced single-select step's option price multiplies by the
    /// amount recorded on the quantity step instead of charging once.
    PerUnit {
        quantity_step: StepId,
        priced_step: StepId,
    },
}

/// A fully validated guided-selling model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguratorModel {
    key: String,
    name: String,
    sku_prefix: String,
    steps: Vec<StepDef>,
    compatibility: Vec<CompatibilityRule>,
    pricing: Vec<PricingRule>,
}

impl ConfiguratorModel {
    /// Validate the whole model graph up front: step ids unique,
    /// dependencies and rules point at strictly earlier steps, every
    /// referenced option exists, pricing rules are well-typed.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        sku_prefix: impl Into<String>,
        steps: Vec<StepDef>,
        compatibility: Vec<CompatibilityRule>,
        pricing: Vec<PricingRule>,
    ) -> Result<Self, ConfiguratorError> {
        let key = validate_slug(key.into(), "model key")
            .map_err(|err| ConfiguratorError::invalid_model(err.to_string()))?;
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfiguratorError::invalid_model("model name cannot be empty"));
        }
        let sku_prefix = sku_prefix.into().trim().to_uppercase();
        if sku_prefix.is_empty() {
            return Err(ConfiguratorError::invalid_model("SKU prefix cannot be empty"));
        }
        if steps.is_empty() {
            return Err(ConfiguratorError::invalid_model("model needs at least one step"));
        }

        let mut positions: BTreeMap<&StepId, usize> = BTreeMap::new();
        for (position, step) in steps.iter().enumerate() {
            if positions.insert(step.id(), position).is_some() {
                return Err(ConfiguratorError::invalid_model(format!(
                    "duplicate step id '{}'",
                    step.id()
                )));
            }
        }

        for (position, step) in steps.iter().enumerate() {
            let Some(dependency) = step.depends_on() else {
                continue;
            };
            let Some(&target) = positions.get(&dependency.step) else {
                return Err(ConfiguratorError::invalid_model(format!(
                    "step '{}' depends on unknown step '{}'",
                    step.id(),
                    dependency.step
                )));
            };
            if target >= position {
                return Err(ConfiguratorError::invalid_model(format!(
                    "step '{}' must depend on an earlier step",
                    step.id()
                )));
            }
            let gate = &steps[target];
            if !matches!(gate.kind(), StepKind::Select { .. }) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "step '{}' depends on '{}', which is not a single-select step",
                    step.id(),
                    dependency.step
                )));
            }
            if dependency.values.is_empty() {
                return Err(ConfiguratorError::invalid_model(format!(
                    "dependency of step '{}' needs at least one trigger option",
                    step.id()
                )));
            }
            for value in &dependency.values {
                if gate.option(value).is_none() {
                    return Err(ConfiguratorError::invalid_model(format!(
                        "dependency of step '{}' references unknown option '{value}'",
                        step.id()
                    )));
                }
            }
        }

        for rule in &compatibility {
            let Some(&when) = positions.get(&rule.when_step) else {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule triggers on unknown step '{}'",
                    rule.when_step
                )));
            };
            let Some(&then) = positions.get(&rule.then_step) else {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule restricts unknown step '{}'",
                    rule.then_step
                )));
            };
            if when >= then {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule on step '{}' must restrict a later step",
                    rule.when_step
                )));
            }
            let trigger = &steps[when];
            if !matches!(trigger.kind(), StepKind::Select { .. }) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule trigger step '{}' must be single-select",
                    rule.when_step
                )));
            }
            if trigger.option(&rule.when_option).is_none() {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule triggers on unknown option '{}' of step '{}'",
                    rule.when_option, rule.when_step
                )));
            }
            let restricted = &steps[then];
            if matches!(restricted.kind(), StepKind::Quantity { .. }) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule cannot restrict quantity step '{}'",
                    rule.then_step
                )));
            }
            if rule.allowed.is_empty() {
                return Err(ConfiguratorError::invalid_model(format!(
                    "rule on step '{}' must allow at least one option",
                    rule.then_step
                )));
            }
            for allowed in &rule.allowed {
                if restricted.option(allowed).is_none() {
                    return Err(ConfiguratorError::invalid_model(format!(
                        "rule allows unknown option '{allowed}' on step '{}'",
                        rule.then_step
                    )));
                }
            }
        }

        let mut priced_steps: BTreeSet<&StepId> = BTreeSet::new();
        for rule in &pricing {
            let PricingRule::PerUnit {
                quantity_step,
                priced_step,
            } = rule
            else {
                continue;
            };
            let Some(&quantity) = positions.get(quantity_step) else {
                return Err(ConfiguratorError::invalid_model(format!(
                    "per-unit rule references unknown step '{quantity_step}'"
                )));
            };
            if !matches!(steps[quantity].kind(), StepKind::Quantity { .. }) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "per-unit rule needs '{quantity_step}' to be a quantity step"
                )));
            }
            let Some(&priced) = positions.get(priced_step) else {
                return Err(ConfiguratorError::invalid_model(format!(
                    "per-unit rule prices unknown step '{priced_step}'"
                )));
            };
            if !matches!(steps[priced].kind(), StepKind::Select { .. }) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "per-unit rule must price a single-select step, not '{priced_step}'"
                )));
            }
            if !priced_steps.insert(priced_step) {
                return Err(ConfiguratorError::invalid_model(format!(
                    "step '{priced_step}' has more than one per-unit rule"
                )));
            }
        }

        Ok(Self {
            key,
            name,
            sku_prefix,
            steps,
            compatibility,
            pricing,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku_prefix(&self) -> &str {
        &self.sku_prefix
    }

    pub fn steps(&self) -> &[StepDef] {
        &self.steps
    }

    pub fn compatibility(&self) -> &[CompatibilityRule] {
        &self.compatibility
    }

    pub fn pricing(&self) -> &[PricingRule] {
        &self.pricing
    }

    pub fn step(&self, id: &StepId) -> Option<&StepDef> {
        self.steps.iter().find(|step| step.id() == id)
    }

    /// Position of a step in model order.
    pub fn step_position(&self, id: &StepId) -> Option<usize> {
        self.steps.iter().position(|step| step.id() == id)
    }
}
