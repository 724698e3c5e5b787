//! Dashboard ordering of tracked people.

use crate::overdue::OVERDUE_THRESHOLD_DAYS;
use crate::person::DerivedPerson;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Known `days_since` at or below this count as fresh.
pub const FRESH_THRESHOLD_DAYS: u32 = 7;

/// Orders the roster for the dashboard, most neglected first.
///
/// `derive` projects every entry into a [`DerivedPerson`]; it is where
/// `days_since` and friends come from. When `search` is non-empty only
/// people whose display name contains it (case-insensitive) are kept.
///
/// Order:
/// 1. known `days_since`, descending
/// 2. unknown `days_since`, `waiting_on_you` first
///
/// Remaining ties keep roster order.
pub fn rank<T, F>(roster: &[T], derive: F, search: Option<&str>) -> Vec<DerivedPerson>
where
    F: FnMut(&T) -> DerivedPerson,
{
    let mut people: Vec<DerivedPerson> = roster.iter().map(derive).collect();

    if let Some(query) = search.map(str::to_lowercase).filter(|q| !q.is_empty()) {
        people.retain(|p| p.display_name.to_lowercase().contains(&query));
    }

    people.sort_by(neglect_order);
    people
}

/// Comparator behind [`rank`].
pub fn neglect_order(a: &DerivedPerson, b: &DerivedPerson) -> Ordering {
    match (a.days_since, b.days_since) {
        (Some(a_days), Some(b_days)) => b_days.cmp(&a_days),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.waiting_on_you.cmp(&a.waiting_on_you),
    }
}

/// Headline counts for the stats bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterStats {
    pub total: usize,
    /// Known `days_since` of 14 or more
    pub overdue: usize,
    /// Known `days_since` of 7 or less
    pub fresh: usize,
}

impl RosterStats {
    pub fn from_people(people: &[DerivedPerson]) -> Self {
        let known = || people.iter().filter_map(|p| p.days_since);
        Self {
            total: people.len(),
            overdue: known().filter(|d| *d >= OVERDUE_THRESHOLD_DAYS).count(),
            fresh: known().filter(|d| *d <= FRESH_THRESHOLD_DAYS).count(),
        }
    }
}
