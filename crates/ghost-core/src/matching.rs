//! Scoring and ranking of chat records against a search query.
//!
//! Scores are on a 0-100 scale:
//!
//! | Match on name or handle (case-insensitive) | Score |
//! |---|---|
//! | exact | 100 |
//! | prefix | 80 |
//! | substring | 60 |
//! | query tokens prefixing name tokens | 40 + 20 × matched / total |
//! | nothing | 0 |
//!
//! With a query, candidates go through a loose filter first (substring of
//! name, handle or network label), are scored, and zero scores are
//! dropped. Without a query the order is recency based instead.

use crate::chat::ChatRecord;
use std::cmp::Ordering;
use tracing::debug;

pub const SCORE_EXACT: f64 = 100.0;
pub const SCORE_PREFIX: f64 = 80.0;
pub const SCORE_SUBSTRING: f64 = 60.0;
pub const SCORE_TOKEN_BASE: f64 = 40.0;
pub const SCORE_TOKEN_SPAN: f64 = 20.0;

/// Default cap for contact log searches.
pub const LOG_SEARCH_LIMIT: usize = 40;

/// Lowercases and trims a raw query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Scores a record against a query. Empty queries score 0.
pub fn score(record: &ChatRecord, query: &str) -> f64 {
    let q = normalize_query(query);
    if q.is_empty() {
        return 0.0;
    }
    score_normalized(record, &q)
}

fn score_normalized(record: &ChatRecord, q: &str) -> f64 {
    let name = record.name_or_empty().to_lowercase();
    let handle = record.handle_or_empty().to_lowercase();

    if name == q || handle == q {
        return SCORE_EXACT;
    }
    if name.starts_with(q) || handle.starts_with(q) {
        return SCORE_PREFIX;
    }
    if name.contains(q) || handle.contains(q) {
        return SCORE_SUBSTRING;
    }

    let query_tokens: Vec<&str> = q.split_whitespace().collect();
    let hits = query_tokens
        .iter()
        .filter(|qt| name.split_whitespace().any(|nt| nt.starts_with(*qt)))
        .count();
    if hits == 0 || query_tokens.is_empty() {
        return 0.0;
    }
    SCORE_TOKEN_BASE + (hits as f64 / query_tokens.len() as f64) * SCORE_TOKEN_SPAN
}

/// Loose pre-filter: query is a substring of name, handle or network label.
fn matches_loosely(record: &ChatRecord, q: &str) -> bool {
    record.name_or_empty().to_lowercase().contains(q)
        || record.handle_or_empty().to_lowercase().contains(q)
        || record.network.label().to_lowercase().contains(q)
}

/// Ranks records against a query.
///
/// With a query: filter, score, drop zeros, sort by score descending.
/// Without one: known recency first (most recent first), then unknown
/// recency by name. Every sort here is stable, so ties keep input order.
pub fn rank<'a, I>(records: I, query: &str) -> Vec<&'a ChatRecord>
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    let q = normalize_query(query);
    if q.is_empty() {
        return recency_order(records);
    }

    let mut scored: Vec<(&ChatRecord, f64)> = records
        .into_iter()
        .filter(|r| matches_loosely(r, &q))
        .map(|r| (r, score_normalized(r, &q)))
        .filter(|(_, s)| *s > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    debug!(query = %q, matches = scored.len(), "Ranked chat candidates");
    scored.into_iter().map(|(r, _)| r).collect()
}

/// Fallback order for an empty query.
fn recency_order<'a, I>(records: I) -> Vec<&'a ChatRecord>
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    let (mut known, mut unknown): (Vec<&ChatRecord>, Vec<&ChatRecord>) =
        records.into_iter().partition(|r| r.days_since.is_some());

    known.sort_by_key(|r| r.days_since);
    unknown.sort_by(|a, b| compare_names(a, b));

    known.extend(unknown);
    known
}

fn compare_names(a: &ChatRecord, b: &ChatRecord) -> Ordering {
    a.name_or_empty()
        .to_lowercase()
        .cmp(&b.name_or_empty().to_lowercase())
}

/// Plain lookup across every chat for the contact log panel.
///
/// Unlike [`rank`] there is no scoring: loose matches come back in input
/// order, capped at `limit`. An empty query finds nothing.
pub fn search_log<'a, I>(records: I, query: &str, limit: usize) -> Vec<&'a ChatRecord>
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    let q = normalize_query(query);
    if q.is_empty() {
        return Vec::new();
    }
    records
        .into_iter()
        .filter(|r| matches_loosely(r, &q))
        .take(limit)
        .collect()
}
