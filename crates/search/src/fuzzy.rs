use storefront_catalog::Product;

/// Tuning knobs for [`search`].
///
/// Boosted tiers multiply past 1.0 so an exact hit always outranks a
/// partial one regardless of threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Minimum score a product must reach to be included.
    pub threshold: f64,
    /// Hard cap on the number of hits returned.
    pub max_results: usize,
    /// Multiplier applied when a field equals the query exactly.
    pub boost_exact: f64,
    /// Multiplier applied when a field starts with the query.
    pub boost_starts_with: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_results: 100,
            boost_exact: 2.0,
            boost_starts_with: 1.5,
        }
    }
}

/// Product fields the scorer can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Sku,
    Category,
    Keywords,
}

/// Field set used when the caller has no preference.
pub const DEFAULT_FIELDS: &[SearchField] = &[
    SearchField::Name,
    SearchField::Sku,
    SearchField::Category,
    SearchField::Keywords,
];

/// One scored match. `score` is the best field score; boosted tiers can
/// push it above 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub product: &'a Product,
    pub score: f64,
    pub matched_fields: Vec<SearchField>,
}

/// Edit distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Similarity between two strings on a 0.0..=1.0 scale.
///
/// Tiers, checked in order: case-insensitive equality, substring in
/// either direction, shared words, and finally normalized edit distance
/// for typo tolerance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return 0.9;
    }

    let a_words: Vec<&str> = a.split_whitespace().collect();
    let b_words: Vec<&str> = b.split_whitespace().collect();
    let word_matches = b_words
        .iter()
        .filter(|b_word| {
            a_words
                .iter()
                .any(|a_word| a_word.contains(**b_word) || b_word.contains(a_word))
        })
        .count();
    if word_matches > 0 {
        return 0.7 + 0.2 * word_matches as f64 / b_words.len() as f64;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let distance = levenshtein(&a, &b);
    (1.0 - distance as f64 / max_len as f64).max(0.0)
}

/// Split a query into lowercase search terms. Punctuation separates
/// terms; terms shorter than two characters are noise and are dropped.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|term| term.chars().count() >= 2)
        .map(str::to_owned)
        .collect()
}

/// Rank `products` against `query` and return hits above the threshold,
/// best first.
///
/// Ties keep catalog order, so repeated searches over the same slice
/// paginate stably. A blank query matches everything at score 1.0.
pub fn search<'a>(
    products: &'a [Product],
    query: &str,
    fields: &[SearchField],
    config: &SearchConfig,
) -> Vec<SearchHit<'a>> {
    if query.trim().is_empty() {
        return products
            .iter()
            .take(config.max_results)
            .map(|product| SearchHit {
                product,
                score: 1.0,
                matched_fields: Vec::new(),
            })
            .collect();
    }

    let query_lower = query.to_lowercase();
    let terms = tokenize(query);

    let mut hits = Vec::new();
    for product in products {
        let mut score = 0.0f64;
        let mut matched_fields = Vec::new();
        for field in fields {
            let field_score = match field {
                SearchField::Name => score_text(product.name(), &query_lower, &terms, config),
                SearchField::Sku => score_text(product.sku(), &query_lower, &terms, config),
                SearchField::Category => {
                    score_text(product.category(), &query_lower, &terms, config)
                }
                SearchField::Keywords => {
                    score_keywords(product.keywords(), &query_lower, &terms, config)
                }
            };
            if field_score > 0.0 {
                score = score.max(field_score);
                matched_fields.push(*field);
            }
        }
        if score >= config.threshold {
            hits.push(SearchHit {
                product,
                score,
                matched_fields,
            });
        }
    }

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(config.max_results);
    hits
}

fn score_text(text: &str, query_lower: &str, terms: &[String], config: &SearchConfig) -> f64 {
    let text = text.to_lowercase();

    if text == query_lower {
        return config.boost_exact;
    }
    if text.starts_with(query_lower) {
        return 0.95 * config.boost_starts_with;
    }
    if text.contains(query_lower) {
        return 0.85;
    }

    // Term-by-term: full credit for contained terms, partial credit when
    // a word of the field is a near-miss for the term.
    let mut term_hits = 0.0f64;
    for term in terms {
        if text.contains(term.as_str()) {
            term_hits += 1.0;
        } else if let Some(near) = best_word_match(&text, term) {
            term_hits += near;
        }
    }
    if term_hits > 0.0 {
        0.5 + 0.4 * term_hits / terms.len() as f64
    } else {
        0.0
    }
}

fn best_word_match(text: &str, term: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|word| similarity(word, term))
        .find(|sim| *sim > 0.7)
}

// Keywords are stored lowercase on the product, so no folding here.
fn score_keywords(
    keywords: &[String],
    query_lower: &str,
    terms: &[String],
    config: &SearchConfig,
) -> f64 {
    let mut best = 0.0f64;
    for keyword in keywords {
        let score = if keyword.as_str() == query_lower {
            config.boost_exact
        } else if keyword.contains(query_lower) {
            0.8
        } else if terms.iter().any(|term| keyword.contains(term.as_str())) {
            0.6
        } else {
            0.0
        };
        if score > best {
            best = score;
        }
    }
    best
}
