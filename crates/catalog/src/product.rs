use serde::{Deserialize, Serialize};
use serde_json::Number;

use storefront_core::{DomainError, DomainResult, Entity, ProductId};

/// Spec keys that collide with built-in query parameters and are rejected
/// at construction time.
pub const RESERVED_SPEC_KEYS: &[&str] = &["category", "keyword", "search"];

/// A single attribute value attached to a product spec.
///
/// Numbers keep their JSON representation so `12`, `12.5` and `0.75`
/// round-trip exactly; everything else is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Number(Number),
    Text(String),
}

impl SpecValue {
    pub fn number(n: impl Into<Number>) -> Self {
        SpecValue::Number(n.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        SpecValue::Text(s.into())
    }

    /// Canonical string form used as facet bucket label and wire value.
    ///
    /// Numbers print via their JSON serialization, so the same number
    /// always yields the same label.
    pub fn canonical(&self) -> String {
        match self {
            SpecValue::Number(n) => n.to_string(),
            SpecValue::Text(s) => s.clone(),
        }
    }

    /// Numeric reading of the value, if it has one.
    ///
    /// Text that parses as a float counts as numeric so range filters
    /// treat `"750"` and `750` the same.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SpecValue::Number(n) => n.as_f64(),
            SpecValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<Number> for SpecValue {
    fn from(n: Number) -> Self {
        SpecValue::Number(n)
    }
}

impl From<&str> for SpecValue {
    fn from(s: &str) -> Self {
        SpecValue::Text(s.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(s: String) -> Self {
        SpecValue::Text(s)
    }
}

/// One `key = value` spec line on a product, with an optional display unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    key: String,
    value: SpecValue,
    unit: Option<String>,
}

impl SpecEntry {
    /// Build a spec entry. The key is trimmed and lowercased so lookups
    /// are case-insensitive; reserved keys are rejected.
    pub fn new(key: impl Into<String>, value: impl Into<SpecValue>) -> DomainResult<Self> {
        let key = key.into().trim().to_lowercase();
        if key.is_empty() {
            return Err(DomainError::validation("spec key cannot be empty"));
        }
        if RESERVED_SPEC_KEYS.contains(&key.as_str()) {
            return Err(DomainError::validation(format!(
                "spec key '{key}' is reserved"
            )));
        }
        Ok(Self {
            key,
            value: value.into(),
            unit: None,
        })
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &SpecValue {
        &self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
}

/// Catalog entry: a sellable product with its filterable attributes.
///
/// Construction validates and normalizes; deserialization rehydrates
/// already-validated records from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    category: String,
    specs: Vec<SpecEntry>,
    keywords: Vec<String>,
    available: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> DomainResult<Self> {
        let sku = sku.into().trim().to_uppercase();
        if sku.is_empty() {
            return Err(DomainError::validation("product SKU cannot be empty"));
        }
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        let category = category.into().trim().to_string();
        if category.is_empty() {
            return Err(DomainError::validation("product category cannot be empty"));
        }
        Ok(Self {
            id,
            sku,
            name,
            category,
            specs: Vec::new(),
            keywords: Vec::new(),
            available: true,
        })
    }

    #[must_use]
    pub fn with_spec(mut self, spec: SpecEntry) -> Self {
        self.specs.push(spec);
        self
    }

    /// Attach search keywords. Keywords are trimmed, lowercased and
    /// deduplicated; insertion order is preserved.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for keyword in keywords {
            let keyword = keyword.into().trim().to_lowercase();
            if !keyword.is_empty() && !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
        self
    }

    #[must_use]
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn specs(&self) -> &[SpecEntry] {
        &self.specs
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// All values recorded for a spec key. A product may carry the same
    /// key several times (e.g. multiple supported voltages).
    pub fn spec_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SpecValue> {
        self.specs
            .iter()
            .filter(move |entry| entry.key == key)
            .map(|entry| &entry.value)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
