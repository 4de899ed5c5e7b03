use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::product::Product;

/// One filterable dimension of the catalog: the product category, the
/// keyword pool, or a single spec key.
///
/// Ordering is derived, so indexes and encoded query strings always list
/// `category`, then `keyword`, then spec keys alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FacetKey {
    Category,
    Keyword,
    Spec(String),
}

impl FacetKey {
    pub fn spec(key: impl Into<String>) -> Self {
        FacetKey::Spec(key.into().trim().to_lowercase())
    }

    /// Wire name of the facet: `category`, `keyword`, or the bare spec key.
    pub fn param_name(&self) -> &str {
        match self {
            FacetKey::Category => "category",
            FacetKey::Keyword => "keyword",
            FacetKey::Spec(key) => key,
        }
    }

    /// Inverse of [`FacetKey::param_name`]. The two reserved names map to
    /// their variants; any other name is read as a spec key.
    pub fn from_param_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.as_str() {
            "category" => FacetKey::Category,
            "keyword" => FacetKey::Keyword,
            _ => FacetKey::Spec(name),
        }
    }
}

impl From<FacetKey> for String {
    fn from(key: FacetKey) -> Self {
        key.param_name().to_string()
    }
}

impl From<String> for FacetKey {
    fn from(name: String) -> Self {
        FacetKey::from_param_name(&name)
    }
}

impl core::fmt::Display for FacetKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.param_name())
    }
}

/// Observed numeric span of a facet's values. Present only when at least
/// one value reads as a number; hosts use it to seed range widgets.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
}

impl NumericSummary {
    fn single(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn widen(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Value buckets of one facet with per-value product counts.
///
/// Counts are product counts: a product carrying the same value twice
/// still counts once per bucket. Values stay listed at count zero when a
/// wider universe registered them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    counts: BTreeMap<String, u64>,
    unit: Option<String>,
    numeric: Option<NumericSummary>,
}

impl Facet {
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn count_of(&self, value: &str) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Display unit of the facet, first one seen across the catalog.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn numeric(&self) -> Option<NumericSummary> {
        self.numeric
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn register(&mut self, label: &str) {
        if !self.counts.contains_key(label) {
            self.counts.insert(label.to_string(), 0);
        }
    }

    fn increment(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_insert(0) += 1;
    }

    fn observe_unit(&mut self, unit: Option<&str>) {
        if self.unit.is_none() {
            self.unit = unit.map(str::to_string);
        }
    }

    fn observe_numeric(&mut self, value: Option<f64>) {
        match (self.numeric.as_mut(), value) {
            (Some(summary), Some(value)) => summary.widen(value),
            (None, Some(value)) => self.numeric = Some(NumericSummary::single(value)),
            _ => {}
        }
    }
}

/// Every facet a catalog slice exposes, keyed and iterated in
/// deterministic [`FacetKey`] order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetIndex {
    facets: BTreeMap<FacetKey, Facet>,
}

impl FacetIndex {
    /// Index the full value universe of `products`, counting how many
    /// products carry each value. Empty input yields an empty index.
    pub fn build(products: &[Product]) -> Self {
        Self::with_counts(products, products)
    }

    /// Value universe from `universe`, counts from `matched`. Values the
    /// universe registers but `matched` never carries stay at count zero.
    pub(crate) fn with_counts<'a>(
        universe: &'a [Product],
        matched: impl IntoIterator<Item = &'a Product>,
    ) -> Self {
        let mut index = FacetIndex::default();
        for product in universe {
            for contribution in contributions(product) {
                let facet = index.facets.entry(contribution.key).or_default();
                facet.register(&contribution.label);
                facet.observe_unit(contribution.unit);
                facet.observe_numeric(contribution.numeric);
            }
        }
        for product in matched {
            let mut seen: BTreeSet<(FacetKey, String)> = BTreeSet::new();
            for contribution in contributions(product) {
                let bucket = (contribution.key, contribution.label);
                if seen.insert(bucket.clone()) {
                    if let Some(facet) = index.facets.get_mut(&bucket.0) {
                        facet.increment(&bucket.1);
                    }
                }
            }
        }
        index
    }

    pub fn facet(&self, key: &FacetKey) -> Option<&Facet> {
        self.facets.get(key)
    }

    pub fn count_of(&self, key: &FacetKey, value: &str) -> u64 {
        self.facet(key).map_or(0, |facet| facet.count_of(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FacetKey, &Facet)> {
        self.facets.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FacetKey> {
        self.facets.keys()
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

struct FacetContribution<'a> {
    key: FacetKey,
    label: String,
    numeric: Option<f64>,
    unit: Option<&'a str>,
}

fn contributions(product: &Product) -> Vec<FacetContribution<'_>> {
    let mut out = Vec::with_capacity(1 + product.keywords().len() + product.specs().len());
    out.push(FacetContribution {
        key: FacetKey::Category,
        label: product.category().to_string(),
        numeric: None,
        unit: None,
    });
    for keyword in product.keywords() {
        out.push(FacetContribution {
            key: FacetKey::Keyword,
            label: keyword.clone(),
            numeric: None,
            unit: None,
        });
    }
    for entry in product.specs() {
        out.push(FacetContribution {
            key: FacetKey::Spec(entry.key().to_string()),
            label: entry.value().canonical(),
            numeric: entry.value().as_f64(),
            unit: entry.unit(),
        });
    }
    out
}
