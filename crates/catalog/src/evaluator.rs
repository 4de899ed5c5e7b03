use crate::facet::{FacetIndex, FacetKey};
use crate::product::Product;
use crate::selection::{FacetConstraint, FilterSelection};

/// Result of applying a [`FilterSelection`] to a catalog slice.
///
/// `matches` keeps the input order. `counts` is recomputed over the
/// matches but keeps the full input's facet/value universe, so values the
/// current selection excludes surface with an explicit zero instead of
/// disappearing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    pub matches: Vec<&'a Product>,
    pub counts: FacetIndex,
}

impl FilterOutcome<'_> {
    /// Zero matches is a valid outcome, never an error.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }
}

/// Apply `selection` to `products`.
///
/// A product matches when every constrained facet is satisfied (AND
/// across facets); within one facet any selected value suffices (OR).
/// A selection naming values or keys no product carries simply matches
/// nothing.
pub fn evaluate<'a>(products: &'a [Product], selection: &FilterSelection) -> FilterOutcome<'a> {
    let matches: Vec<&'a Product> = products
        .iter()
        .filter(|product| matches_selection(product, selection))
        .collect();
    let counts = FacetIndex::with_counts(products, matches.iter().copied());
    FilterOutcome { matches, counts }
}

fn matches_selection(product: &Product, selection: &FilterSelection) -> bool {
    selection
        .iter()
        .all(|(key, constraint)| matches_constraint(product, key, constraint))
}

fn matches_constraint(product: &Product, key: &FacetKey, constraint: &FacetConstraint) -> bool {
    match constraint {
        FacetConstraint::AnyOf(values) => {
            if values.is_empty() {
                return true;
            }
            match key {
                FacetKey::Category => values.contains(product.category()),
                FacetKey::Keyword => product
                    .keywords()
                    .iter()
                    .any(|keyword| values.contains(keyword.as_str())),
                FacetKey::Spec(spec_key) => product
                    .spec_values(spec_key)
                    .any(|value| values.contains(value.canonical().as_str())),
            }
        }
        FacetConstraint::Range(range) => match key {
            FacetKey::Spec(spec_key) => product
                .spec_values(spec_key)
                .any(|value| value.as_f64().is_some_and(|number| range.contains(number))),
            // Ranges are numeric; category and keyword buckets have no
            // numeric reading.
            FacetKey::Category | FacetKey::Keyword => false,
        },
    }
}
