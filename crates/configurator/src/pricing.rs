//! Price and SKU derivation over a recorded configuration.
//!
//! Arithmetic saturates; a merchandising model pathological enough to
//! overflow u64 cents produces a capped price, not a panic.

use crate::model::{ConfiguratorModel, PricingRule, StepId, StepKind};
use crate::session::{Configuration, ConfigurationEntry, SelectionValue};

pub(crate) fn total_price(model: &ConfiguratorModel, configuration: &Configuration) -> u64 {
    let mut total = 0u64;
    for rule in model.pricing() {
        if let PricingRule::Base { amount } = rule {
            total = total.saturating_add(*amount);
        }
    }
    for entry in configuration.entries() {
        total = total.saturating_add(line_price(model, configuration, entry));
    }
    total
}

/// Price of one recorded entry. Single-select options charge once unless
/// a per-unit rule multiplies them by the recorded quantity; multi-select
/// options sum; the quantity entry itself carries no price.
pub(crate) fn line_price(
    model: &ConfiguratorModel,
    configuration: &Configuration,
    entry: &ConfigurationEntry,
) -> u64 {
    let Some(step) = model.step(&entry.step) else {
        return 0;
    };
    match &entry.value {
        SelectionValue::Single(option_id) => {
            let Some(option) = step.option(option_id) else {
                return 0;
            };
            match per_unit_amount(model, configuration, &entry.step) {
                Some(amount) => option.price().saturating_mul(u64::from(amount)),
                None => option.price(),
            }
        }
        SelectionValue::Multi(options) => options
            .iter()
            .filter_map(|id| step.option(id))
            .fold(0u64, |sum, option| sum.saturating_add(option.price())),
        SelectionValue::Quantity(_) => 0,
    }
}

/// The quantity to multiply `priced_step` by, when a per-unit rule names
/// it and its quantity step is recorded. Unrecorded quantity means the
/// option charges once.
fn per_unit_amount(
    model: &ConfiguratorModel,
    configuration: &Configuration,
    priced_step: &StepId,
) -> Option<u32> {
    model.pricing().iter().find_map(|rule| match rule {
        PricingRule::PerUnit {
            quantity_step,
            priced_step: priced,
        } if priced == priced_step => match configuration.get(quantity_step) {
            Some(SelectionValue::Quantity(amount)) => Some(*amount),
            _ => None,
        },
        _ => None,
    })
}

/// SKU prefix plus one fragment per recorded step in model order:
/// single-select choices contribute their SKU fragment (or uppercased
/// option id), quantity steps contribute `{amount}{UNIT}`.
pub(crate) fn assemble_sku(model: &ConfiguratorModel, configuration: &Configuration) -> String {
    let mut parts: Vec<String> = vec![model.sku_prefix().to_string()];
    for entry in configuration.entries() {
        let Some(step) = model.step(&entry.step) else {
            continue;
        };
        match &entry.value {
            SelectionValue::Single(option_id) => {
                let fragment = step
                    .option(option_id)
                    .and_then(|option| option.sku_fragment())
                    .map_or_else(|| option_id.as_str().to_uppercase(), str::to_uppercase);
                parts.push(fragment);
            }
            SelectionValue::Multi(_) => {}
            SelectionValue::Quantity(amount) => {
                if let StepKind::Quantity { limits } = step.kind() {
                    parts.push(format!("{amount}{}", limits.unit().to_uppercase()));
                }
            }
        }
    }
    parts.join("-")
}
