//! Catalog domain module: products, facets and filtering.
//!
//! Everything here is pure, deterministic domain logic (no IO, no HTTP,
//! no storage). Hosts load a product slice, build a [`FacetIndex`], and
//! run [`evaluate`] for each change to the shopper's [`FilterSelection`].

pub mod evaluator;
pub mod facet;
pub mod product;
pub mod selection;

pub use evaluator::{FilterOutcome, evaluate};
pub use facet::{Facet, FacetIndex, FacetKey, NumericSummary};
pub use product::{Product, RESERVED_SPEC_KEYS, SpecEntry, SpecValue};
pub use selection::{FacetConstraint, FilterSelection, ValueRange};
