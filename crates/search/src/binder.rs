use std::collections::BTreeSet;

use serde_json::Number;

use storefront_catalog::{FacetConstraint, FacetIndex, FacetKey, FilterSelection, ValueRange};

/// Query parameter reserved for the free-text search term. Facet decoding
/// skips it; [`search_term`] reads it.
pub const SEARCH_PARAM: &str = "search";

/// Render a selection as query-string pairs.
///
/// Pairs follow [`FacetKey`] order and `AnyOf` values are sorted, so equal
/// selections always produce byte-identical output. Keys and values are
/// percent-encoded; multiple values join with `,`; ranges render as
/// `min..max` with an absent bound left empty.
pub fn encode(selection: &FilterSelection) -> Vec<(String, String)> {
    selection
        .iter()
        .map(|(key, constraint)| {
            let name = urlencoding::encode(key.param_name()).into_owned();
            (name, encode_constraint(constraint))
        })
        .collect()
}

/// [`encode`] plus a trailing `search` pair when `term` is non-blank.
pub fn encode_with_search(selection: &FilterSelection, term: &str) -> Vec<(String, String)> {
    let mut pairs = encode(selection);
    let term = term.trim();
    if !term.is_empty() {
        pairs.push((
            SEARCH_PARAM.to_string(),
            urlencoding::encode(term).into_owned(),
        ));
    }
    pairs
}

fn encode_constraint(constraint: &FacetConstraint) -> String {
    match constraint {
        FacetConstraint::AnyOf(values) => values
            .iter()
            .map(|value| urlencoding::encode(value))
            .collect::<Vec<_>>()
            .join(","),
        FacetConstraint::Range(range) => {
            let min = range.min().map(ToString::to_string).unwrap_or_default();
            let max = range.max().map(ToString::to_string).unwrap_or_default();
            format!("{min}..{max}")
        }
    }
}

/// Rebuild a selection from query-string pairs. Never fails: pairs that
/// cannot be read are dropped instead.
///
/// Dropped input: percent-sequences that do not decode to UTF-8, blank
/// values, range literals with an unreadable or inverted bound, and the
/// reserved `search` parameter. When the same key appears twice the last
/// occurrence wins.
pub fn decode<'a, I>(pairs: I) -> FilterSelection
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut selection = FilterSelection::new();
    for (raw_key, raw_value) in pairs {
        let Ok(name) = urlencoding::decode(raw_key) else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(SEARCH_PARAM) {
            continue;
        }
        if let Some(constraint) = decode_constraint(raw_value) {
            selection.set(FacetKey::from_param_name(name), constraint);
        }
    }
    selection
}

/// [`decode`], then prune everything the index cannot satisfy. This is
/// the entry point for inbound URLs: stale links and hand-edited query
/// strings collapse to the filters that still mean something.
pub fn decode_for<'a, I>(pairs: I, index: &FacetIndex) -> FilterSelection
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    decode(pairs).pruned(index)
}

/// First non-blank `search` parameter, percent-decoded and trimmed.
pub fn search_term<'a, I>(pairs: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (raw_key, raw_value) in pairs {
        let Ok(name) = urlencoding::decode(raw_key) else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case(SEARCH_PARAM) {
            continue;
        }
        let Ok(value) = urlencoding::decode(raw_value) else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Join encoded pairs into a `key=value&key=value` string.
pub fn query_string(pairs: &[(String, String)]) -> String {
    let mut query = String::new();
    for (key, value) in pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(key);
        query.push('=');
        query.push_str(value);
    }
    query
}

/// Split a query string into raw pairs. A leading `?` is tolerated,
/// empty segments are skipped, and a segment without `=` reads as a key
/// with an empty value.
pub fn parse_query_string(query: &str) -> Vec<(&str, &str)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.split_once('=').unwrap_or((segment, "")))
        .collect()
}

/// [`parse_query_string`] and [`decode`] in one step.
pub fn decode_query_string(query: &str) -> FilterSelection {
    decode(parse_query_string(query))
}

enum Bound {
    Open,
    Numeric(Number),
    Text,
}

fn classify_bound(raw: &str) -> Bound {
    if raw.is_empty() {
        return Bound::Open;
    }
    match raw.parse::<Number>() {
        Ok(n) => Bound::Numeric(n),
        Err(_) => Bound::Text,
    }
}

fn decode_constraint(raw: &str) -> Option<FacetConstraint> {
    if raw.is_empty() {
        return None;
    }
    if let Some((min, max)) = raw.split_once("..") {
        match (classify_bound(min), classify_bound(max)) {
            // ".." with both sides open constrains nothing.
            (Bound::Open, Bound::Open) => return None,
            // Text on both sides is a literal value that happens to
            // contain dots; fall through to the value-list path.
            (Bound::Text, Bound::Text) => {}
            (min, max) => return decode_range(min, max),
        }
    }

    let values: BTreeSet<String> = raw
        .split(',')
        .filter_map(|piece| urlencoding::decode(piece).ok())
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(FacetConstraint::AnyOf(values))
    }
}

fn decode_range(min: Bound, max: Bound) -> Option<FacetConstraint> {
    let min = match min {
        Bound::Numeric(n) => Some(n),
        Bound::Open => None,
        Bound::Text => return None,
    };
    let max = match max {
        Bound::Numeric(n) => Some(n),
        Bound::Open => None,
        Bound::Text => return None,
    };
    ValueRange::new(min, max).ok().map(FacetConstraint::Range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{Product, SpecEntry, SpecValue};
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
    fn encode_orders_facets_canonically() {
        let mut selection = FilterSelection::new();
        selection.set_range(FacetKey::spec("power"), ValueRange::at_least(500));
        selection.select(FacetKey::Keyword, "pump");
        selection.select(FacetKey::Category, "Pumps");

        let keys: Vec<String> = encode(&selection).into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["category", "keyword", "power"]);
    }

    #[test]
    fn encode_joins_sorted_values_and_escapes() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Hoses");
        selection.select(FacetKey::Category, "Garden Pumps");
        selection.select(FacetKey::Keyword, "blüte");

        let pairs = encode(&selection);
        assert_eq!(pairs[0], ("category".to_string(), "Garden%20Pumps,Hoses".to_string()));
        assert_eq!(pairs[1], ("keyword".to_string(), "bl%C3%BCte".to_string()));
    }

    #[test]
    fn encode_escapes_spec_keys() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::spec("flow rate"), "high");

        let pairs = encode(&selection);
        assert_eq!(pairs[0].0, "flow%20rate");
    }

    #[test]
    fn encode_renders_range_bounds() {
        let mut selection = FilterSelection::new();
        selection.set_range(FacetKey::spec("power"), ValueRange::between(500, 1000).unwrap());
        assert_eq!(encode(&selection)[0].1, "500..1000");

        selection.set_range(FacetKey::spec("power"), ValueRange::at_least(500));
        assert_eq!(encode(&selection)[0].1, "500..");

        selection.set_range(FacetKey::spec("power"), ValueRange::at_most(1000));
        assert_eq!(encode(&selection)[0].1, "..1000");
    }

    #[test]
    fn decode_reads_values_and_ranges() {
        let decoded = decode([("category", "Pumps,Hoses"), ("power", "500..1000")]);

        match decoded.get(&FacetKey::Category) {
            Some(FacetConstraint::AnyOf(values)) => {
                assert!(values.contains("Pumps"));
                assert!(values.contains("Hoses"));
            }
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
        match decoded.get(&FacetKey::spec("power")) {
            Some(FacetConstraint::Range(range)) => {
                assert!(range.contains(750.0));
                assert!(!range.contains(1500.0));
            }
            other => panic!("Expected Range constraint, got {other:?}"),
        }
    }

    #[test]
    fn decode_unescapes_percent_sequences() {
        let decoded = decode([("flow%20rate", "very%20high,l%C3%A4ngs")]);
        match decoded.get(&FacetKey::spec("flow rate")) {
            Some(FacetConstraint::AnyOf(values)) => {
                assert!(values.contains("very high"));
                assert!(values.contains("längs"));
            }
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
    }

    #[test]
    fn decode_skips_search_and_blank_parameters() {
        let decoded = decode([("search", "pomp"), ("category", ""), ("", "x")]);
        assert!(decoded.is_empty());
    }

    #[test]
    fn decode_drops_malformed_input() {
        assert!(decode([("power", "750..abc")]).is_empty());
        assert!(decode([("power", "10..5")]).is_empty());
        assert!(decode([("power", "..")]).is_empty());
        // %FF does not decode to UTF-8; %zz stays literal text.
        assert!(decode([("power", "%FF")]).is_empty());
        assert!(decode([("%FF", "750")]).is_empty());
    }

    #[test]
    fn decode_keeps_dotted_text_as_a_literal_value() {
        let decoded = decode([("material", "a..b")]);
        match decoded.get(&FacetKey::spec("material")) {
            Some(FacetConstraint::AnyOf(values)) => assert!(values.contains("a..b")),
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
    }

    #[test]
    fn decode_lets_the_last_duplicate_key_win() {
        let decoded = decode([("power", "500.."), ("power", "750")]);
        match decoded.get(&FacetKey::spec("power")) {
            Some(FacetConstraint::AnyOf(values)) => assert!(values.contains("750")),
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
    }

    #[test]
    fn decode_for_prunes_against_the_index() {
        let index = sample_index();
        let decoded = decode_for(
            [
                ("category", "Pumps,Chairs"),
                ("color", "red"),
                ("power", "500..1000"),
            ],
            &index,
        );

        assert_eq!(decoded.len(), 2);
        match decoded.get(&FacetKey::Category) {
            Some(FacetConstraint::AnyOf(values)) => {
                assert!(values.contains("Pumps"));
                assert!(!values.contains("Chairs"));
            }
            other => panic!("Expected AnyOf constraint, got {other:?}"),
        }
        assert!(decoded.get(&FacetKey::spec("power")).is_some());
        assert!(decoded.get(&FacetKey::spec("color")).is_none());
    }

    #[test]
    fn search_term_returns_first_non_blank_value() {
        let term = search_term([
            ("search", ""),
            ("search", "garden%20pump"),
            ("search", "second"),
        ]);
        assert_eq!(term.as_deref(), Some("garden pump"));

        assert_eq!(search_term([("category", "Pumps")]), None);
    }

    #[test]
    fn encode_with_search_appends_the_term() {
        let mut selection = FilterSelection::new();
        selection.select(FacetKey::Category, "Pumps");

        let pairs = encode_with_search(&selection, "  garden pump ");
        assert_eq!(
            pairs.last(),
            Some(&("search".to_string(), "garden%20pump".to_string()))
        );

        let pairs = encode_with_search(&selection, "   ");
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn parse_query_string_tolerates_junk() {
        let pairs = parse_query_string("?a=1&&b=2&c");
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("c", "")]);
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn decode_query_string_end_to_end() {
        let decoded = decode_query_string("?category=Pumps&power=500..");
        assert_eq!(decoded.len(), 2);
        assert!(decoded.get(&FacetKey::Category).is_some());
        assert!(decoded.get(&FacetKey::spec("power")).is_some());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn facet_key_strategy() -> impl Strategy<Value = FacetKey> {
            prop_oneof![
                Just(FacetKey::Category),
                Just(FacetKey::Keyword),
                "[a-z][a-z0-9-]{0,8}"
                    .prop_filter("built-in parameter names", |key| {
                        !matches!(key.as_str(), "category" | "keyword" | "search")
                    })
                    .prop_map(FacetKey::spec),
            ]
        }

        // Values stay clear of range-literal shapes: a stored value like
        // "5.." would decode as a range, which is outside the canonical
        // domain the round-trip law covers.
        fn value_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z]([a-z0-9 ,._-]{0,6}[a-z0-9])?"
                    .prop_filter("range-literal shaped", |value| !value.contains("..")),
                "[a-zà-öø-ÿ]{1,6}",
            ]
        }

        fn number_strategy() -> impl Strategy<Value = Number> {
            prop_oneof![
                any::<i64>().prop_map(Number::from),
                prop::num::f64::NORMAL.prop_map(|f| Number::from_f64(f).unwrap()),
            ]
        }

        fn range_strategy() -> impl Strategy<Value = ValueRange> {
            prop_oneof![
                number_strategy().prop_map(ValueRange::at_least),
                number_strategy().prop_map(ValueRange::at_most),
                (number_strategy(), number_strategy()).prop_map(|(a, b)| {
                    let a_key = a.as_f64().unwrap_or(0.0);
                    let b_key = b.as_f64().unwrap_or(0.0);
                    let (lo, hi) = if a_key <= b_key { (a, b) } else { (b, a) };
                    ValueRange::new(Some(lo), Some(hi)).unwrap()
                }),
            ]
        }

        fn constraint_strategy() -> impl Strategy<Value = FacetConstraint> {
            prop_oneof![
                prop::collection::btree_set(value_strategy(), 1..4).prop_map(FacetConstraint::AnyOf),
                range_strategy().prop_map(FacetConstraint::Range),
            ]
        }

        fn selection_strategy() -> impl Strategy<Value = FilterSelection> {
            prop::collection::btree_map(facet_key_strategy(), constraint_strategy(), 0..4)
                .prop_map(|facets| {
                    let mut selection = FilterSelection::new();
                    for (key, constraint) in facets {
                        selection.set(key, constraint);
                    }
                    selection
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: encode → query string → parse → decode restores
            /// the selection exactly.
            #[test]
            fn query_string_round_trip(selection in selection_strategy()) {
                let query = query_string(&encode(&selection));
                let pairs = parse_query_string(&query);
                let decoded = decode(pairs.iter().copied());
                prop_assert_eq!(decoded, selection);
            }

            /// Property: decoding arbitrary junk never panics and never
            /// yields an unconstrained facet.
            #[test]
            fn decode_is_total(
                pairs in prop::collection::vec(("[ -~]{0,10}", "[ -~]{0,10}"), 0..6)
            ) {
                let borrowed: Vec<(&str, &str)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                let decoded = decode(borrowed);
                for (_, constraint) in decoded.iter() {
                    prop_assert!(!constraint.is_unconstrained());
                }
            }

            /// Property: pruning decoded input against an index is a
            /// fixed point of decode_for.
            #[test]
            fn decode_for_is_idempotent_under_pruning(
                pairs in prop::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9,.]{0,10}"), 0..5)
            ) {
                let index = sample_index();
                let borrowed: Vec<(&str, &str)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                let decoded = decode_for(borrowed, &index);
                prop_assert_eq!(decoded.pruned(&index), decoded);
            }
        }
    }
}
