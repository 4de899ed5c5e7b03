//! Product search and URL binding for the storefront.
//!
//! [`fuzzy`] ranks catalog products against free-text queries with typo
//! tolerance. [`binder`] maps filter selections to and from query-string
//! pairs so a filtered catalog view can live in a shareable URL.

pub mod binder;
pub mod fuzzy;

pub use binder::{
    SEARCH_PARAM, decode, decode_for, decode_query_string, encode, encode_with_search,
    parse_query_string, query_string, search_term,
};
pub use fuzzy::{
    DEFAULT_FIELDS, SearchConfig, SearchField, SearchHit, levenshtein, search, similarity,
    tokenize,
};
