use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Number;

use storefront_core::{DomainError, DomainResult, ValueObject};

use crate::facet::{FacetIndex, FacetKey};

/// Inclusive numeric bounds for a range filter. At least one bound is
/// always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    min: Option<Number>,
    max: Option<Number>,
}

impl ValueRange {
    pub fn new(min: Option<Number>, max: Option<Number>) -> DomainResult<Self> {
        if min.is_none() && max.is_none() {
            return Err(DomainError::validation("range requires at least one bound"));
        }
        if let (Some(lo), Some(hi)) = (
            min.as_ref().and_then(Number::as_f64),
            max.as_ref().and_then(Number::as_f64),
        ) {
            if lo > hi {
                return Err(DomainError::validation("range minimum exceeds maximum"));
            }
        }
        Ok(Self { min, max })
    }

    pub fn at_least(min: impl Into<Number>) -> Self {
        Self {
            min: Some(min.into()),
            max: None,
        }
    }

    pub fn at_most(max: impl Into<Number>) -> Self {
        Self {
            min: None,
            max: Some(max.into()),
        }
    }

    pub fn between(min: impl Into<Number>, max: impl Into<Number>) -> DomainResult<Self> {
        Self::new(Some(min.into()), Some(max.into()))
    }

    pub fn min(&self) -> Option<&Number> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Number> {
        self.max.as_ref()
    }

    /// Inclusive containment check. An absent bound is open.
    pub fn contains(&self, value: f64) -> bool {
        let above_min = self
            .min
            .as_ref()
            .and_then(Number::as_f64)
            .map_or(true, |min| value >= min);
        let below_max = self
            .max
            .as_ref()
            .and_then(Number::as_f64)
            .map_or(true, |max| value <= max);
        above_min && below_max
    }
}

impl ValueObject for ValueRange {}

/// Constraint applied to one facet: match any of a value set, or fall
/// inside a numeric range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetConstraint {
    AnyOf(BTreeSet<String>),
    Range(ValueRange),
}

impl FacetConstraint {
    pub fn any_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FacetConstraint::AnyOf(values.into_iter().map(Into::into).collect())
    }

    /// An empty value set constrains nothing and is never stored in a
    /// [`FilterSelection`].
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, FacetConstraint::AnyOf(values) if values.is_empty())
    }
}

impl ValueObject for FacetConstraint {}

/// The filters a shopper currently has active, one constraint per facet.
///
/// Iteration follows [`FacetKey`] order regardless of insertion order, so
/// two selections built along different paths compare and encode equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    facets: BTreeMap<FacetKey, FacetConstraint>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the facet's `AnyOf` set. A range constraint on the
    /// same facet is replaced.
    pub fn select(&mut self, key: FacetKey, value: impl Into<String>) {
        let value = value.into();
        match self.facets.get_mut(&key) {
            Some(FacetConstraint::AnyOf(values)) => {
                values.insert(value);
            }
            _ => {
                self.facets
                    .insert(key, FacetConstraint::any_of([value]));
            }
        }
    }

    /// Remove `value` from the facet's `AnyOf` set, dropping the facet
    /// entirely when its last value goes.
    pub fn deselect(&mut self, key: &FacetKey, value: &str) {
        if let Some(FacetConstraint::AnyOf(values)) = self.facets.get_mut(key) {
            values.remove(value);
            if values.is_empty() {
                self.facets.remove(key);
            }
        }
    }

    pub fn toggle(&mut self, key: FacetKey, value: impl Into<String>) {
        let value = value.into();
        let selected = matches!(
            self.facets.get(&key),
            Some(FacetConstraint::AnyOf(values)) if values.contains(&value)
        );
        if selected {
            self.deselect(&key, &value);
        } else {
            self.select(key, value);
        }
    }

    /// Replace the facet's constraint wholesale. Unconstrained input
    /// clears the facet instead of storing an empty set.
    pub fn set(&mut self, key: FacetKey, constraint: FacetConstraint) {
        if constraint.is_unconstrained() {
            self.facets.remove(&key);
        } else {
            self.facets.insert(key, constraint);
        }
    }

    pub fn set_range(&mut self, key: FacetKey, range: ValueRange) {
        self.set(key, FacetConstraint::Range(range));
    }

    pub fn clear_facet(&mut self, key: &FacetKey) {
        self.facets.remove(key);
    }

    pub fn clear(&mut self) {
        self.facets.clear();
    }

    pub fn get(&self, key: &FacetKey) -> Option<&FacetConstraint> {
        self.facets.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FacetKey, &FacetConstraint)> {
        self.facets.iter()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Copy of this selection with everything the index cannot satisfy
    /// removed: facets the index does not know, `AnyOf` values with a
    /// zero count, and ranges no counted value falls into.
    #[must_use]
    pub fn pruned(&self, index: &FacetIndex) -> Self {
        let mut pruned = FilterSelection::new();
        for (key, constraint) in &self.facets {
            let Some(facet) = index.facet(key) else {
                continue;
            };
            match constraint {
                FacetConstraint::AnyOf(values) => {
                    let live: BTreeSet<String> = values
                        .iter()
                        .filter(|value| facet.count_of(value) > 0)
                        .cloned()
                        .collect();
                    if !live.is_empty() {
                        pruned.facets.insert(key.clone(), FacetConstraint::AnyOf(live));
                    }
                }
                FacetConstraint::Range(range) => {
                    let satisfiable = facet.counts().iter().any(|(label, count)| {
                        *count > 0
                            && label
                                .trim()
                                .parse::<f64>()
                                .is_ok_and(|value| range.contains(value))
                    });
                    if satisfiable {
                        pruned
                            .facets
                            .insert(key.clone(), FacetConstraint::Range(range.clone()));
                    }
                }
            }
        }
        pruned
    }
}

impl ValueObject for FilterSelection {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Product, SpecEntry, SpecValue};
    use storefront_core::ProductId;

    fn sample_index() -> FacetIndex {
        let catalog = vec![
            Product::new(ProductId::new(), "BP-001", "Garden Pump", "Pumps")
                .unwrap()
                .with_keywords(["pump"])
                .with_spec(SpecEntry::new("power", SpecValue::number(750)).unwrap()),
            Product::new(ProductId::new(), "GH-010", "Garden Hose", "Hoses")
                .unwrap()
                .with_spec(SpecEntry::new("length", SpecValue::number(25)).unwrap()),
        ];
        FacetIndex::build(&catalog)
    }

    #[test]
    fn select_and_deselect_maintain_the_value_set() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Pumps");
        selection.select(FacetKey::Category, "Hoses");
        assert_eq!(selection.len(), 1);

        selection.deselect(&FacetKey::Category, "Pumps");
        match selection.get(&FacetKey::Category) {
            Some(FacetConstraint::AnyOf(values)) => {
                assert_eq!(values.iter().collect::<Vec<_>>(), vec!["Hoses"]);
            }
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }

        selection.deselect(&FacetKey::Category, "Hoses");
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = FilterSelection::new();
        selection.toggle(FacetKey::Keyword, "pump");
        assert!(selection.get(&FacetKey::Keyword).is_some());
        selection.toggle(FacetKey::Keyword, "pump");
        assert!(selection.is_empty());
    }

    #[test]
    fn set_with_empty_any_of_clears_the_facet() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Pumps");
        selection.set(FacetKey::Category, FacetConstraint::any_of::<_, String>([]));
        assert!(selection.is_empty());
    }

    #[test]
    fn select_replaces_a_range_constraint() {
        let mut selection = FilterSelection::new();
        selection.set_range(FacetKey::spec("power"), ValueRange::at_least(500));
        selection.select(FacetKey::spec("power"), "750");
        match selection.get(&FacetKey::spec("power")) {
            Some(FacetConstraint::AnyOf(values)) => assert!(values.contains("750")),
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
    }

    #[test]
    fn range_requires_a_bound_and_ordered_bounds() {
        let err = ValueRange::new(None, None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty range"),
        }

        let err = ValueRange::between(100, 50).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for inverted range"),
        }
    }

    #[test]
    fn range_contains_is_inclusive_and_open_ended() {
        let range = ValueRange::between(500, 1000).unwrap();
        assert!(range.contains(500.0));
        assert!(range.contains(1000.0));
        assert!(!range.contains(499.9));

        assert!(ValueRange::at_least(500).contains(1_000_000.0));
        assert!(ValueRange::at_most(500).contains(-3.0));
    }

    #[test]
    fn pruned_drops_unknown_facets_and_dead_values() {
        let index = sample_index();
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Pumps");
        selection.select(FacetKey::Category, "Chairs");
        selection.select(FacetKey::spec("color"), "red");

        let pruned = selection.pruned(&index);
        assert_eq!(pruned.len(), 1);
        match pruned.get(&FacetKey::Category) {
            Some(FacetConstraint::AnyOf(values)) => {
                assert!(values.contains("Pumps"));
                assert!(!values.contains("Chairs"));
            }
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
    }

    #[test]
    fn pruned_keeps_only_satisfiable_ranges() {
        let index = sample_index();
        let mut selection = FilterSelection::new();
        selection.set_range(FacetKey::spec("power"), ValueRange::between(500, 1000).unwrap());
        selection.set_range(FacetKey::spec("length"), ValueRange::at_least(100));

        let pruned = selection.pruned(&index);
        assert!(pruned.get(&FacetKey::spec("power")).is_some());
        assert!(pruned.get(&FacetKey::spec("length")).is_none());
    }

    #[test]
    fn serde_round_trip_preserves_constraints() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Pumps");
        selection.set_range(FacetKey::spec("power"), ValueRange::between(500, 1000).unwrap());

        let json = serde_json::to_string(&selection).unwrap();
        let back: FilterSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selection);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: toggling the same value twice restores the selection.
            #[test]
            fn double_toggle_is_identity(
                values in prop::collection::vec("[a-z]{1,8}", 0..6),
                toggled in "[a-z]{1,8}"
            ) {
                let mut selection = FilterSelection::new();
                for value in &values {
                    selection.select(FacetKey::Keyword, value.clone());
                }
                let before = selection.clone();

                selection.toggle(FacetKey::Keyword, toggled.clone());
                selection.toggle(FacetKey::Keyword, toggled);
                prop_assert_eq!(selection, before);
            }

            /// Property: pruning is idempotent.
            #[test]
            fn pruned_is_idempotent(
                selected in prop::collection::vec("[A-Za-z]{1,8}", 0..6)
            ) {
                let index = sample_index();
                let mut selection = FilterSelection::new();
                for value in selected {
                    selection.select(FacetKey::Category, value);
                }
                selection.select(FacetKey::Category, "Pumps");

                let once = selection.pruned(&index);
                let twice = once.pruned(&index);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
