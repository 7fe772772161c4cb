//! Fuzzy ranking of stop names against a free-text query.
//!
//! Scores are integers from 0 to 100. Both strings are case-folded and
//! stripped of punctuation, then compared with normalized Levenshtein
//! similarity. When one string is much longer than the other, the shorter
//! one is also slid across the longer one and the best window counts,
//! discounted slightly, so `"bryant"` still finds `"42 St-Bryant Pk"`.

use strsim::normalized_levenshtein;

/// Number of candidates offered for disambiguation.
pub const DEFAULT_LIMIT: usize = 5;

/// Length ratio above which partial matching kicks in.
const PARTIAL_RATIO_THRESHOLD: f64 = 1.5;
const PARTIAL_SCALE: f64 = 0.9;

/// A ranked stop name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub score: u8,
}

/// Ranks `names` by similarity to `query` and returns the best `limit`.
///
/// Results are ordered by descending score. Among equal scores a name equal
/// to `query` as typed comes first; otherwise the order of `names` is kept.
pub fn fuzzy_match<S: AsRef<str>>(query: &str, names: &[S], limit: usize) -> Vec<Candidate> {
    let raw_query = query;
    let query = normalize(query);

    let mut ranked: Vec<Candidate> = names
        .iter()
        .map(|name| Candidate {
            name: name.as_ref().to_string(),
            score: score(&query, &normalize(name.as_ref())),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| (b.name == raw_query).cmp(&(a.name == raw_query)))
    });
    ranked.truncate(limit);
    ranked
}

/// Similarity of two already normalized strings.
fn score(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let ratio = normalized_levenshtein(a, b);

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_len = long.chars().count();

    let best = if long_len as f64 / short_len as f64 >= PARTIAL_RATIO_THRESHOLD {
        ratio.max(partial_ratio(short, long) * PARTIAL_SCALE)
    } else {
        ratio
    };

    (best * 100.0).round() as u8
}

/// Best similarity between `short` and any window of `long` of the same length.
fn partial_ratio(short: &str, long: &str) -> f64 {
    let long: Vec<char> = long.chars().collect();
    let width = short.chars().count();

    long.windows(width)
        .map(|w| normalized_levenshtein(short, &w.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

/// Lowercases, turns punctuation into spaces and collapses whitespace.
fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
