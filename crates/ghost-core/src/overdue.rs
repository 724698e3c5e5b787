//! Rising-edge detection for people who just became overdue.
//!
//! The detector keeps one bit per person id: "was overdue at the last
//! check". Each check compares against it and reports only the
//! not-overdue → overdue transitions, so a person who stays overdue
//! fires once, and fires again only after recovering first.
//!
//! The snapshot lives for the process lifetime and is never persisted.
//! Entries for people who leave the roster are kept; the map is bounded
//! by the number of ids ever seen.
//!
//! Calls must be serialized by the owner (`&mut self` enforces this within
//! one task).

use crate::person::{DerivedPerson, PersonId};
use std::collections::HashMap;
use tracing::{debug, info};

/// Days without contact after which a person counts as overdue.
pub const OVERDUE_THRESHOLD_DAYS: u32 = 14;

/// True when `days_since` is known and at least `threshold_days`.
#[must_use]
pub fn is_overdue(days_since: Option<u32>, threshold_days: u32) -> bool {
    days_since.is_some_and(|days| days >= threshold_days)
}

/// Stateful watcher over successive roster refreshes.
#[derive(Debug, Clone)]
pub struct OverdueDetector {
    threshold_days: u32,
    snapshot: HashMap<PersonId, bool>,
}

impl OverdueDetector {
    /// Creates a detector with the default 14-day threshold and an empty snapshot.
    pub fn new() -> Self {
        Self::with_threshold(OVERDUE_THRESHOLD_DAYS)
    }

    /// Creates a detector with a custom threshold.
    pub fn with_threshold(threshold_days: u32) -> Self {
        Self {
            threshold_days,
            snapshot: HashMap::new(),
        }
    }

    pub fn threshold_days(&self) -> u32 {
        self.threshold_days
    }

    /// Overdue status recorded at the last check; unseen ids are not overdue.
    #[must_use]
    pub fn was_overdue(&self, id: &PersonId) -> bool {
        self.snapshot.get(id).copied().unwrap_or(false)
    }

    /// Number of ids in the snapshot, including people no longer on the roster.
    pub fn tracked(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns ids that crossed into overdue since the previous call, in
    /// roster order, then records every person's current status.
    pub fn detect_rising_edges(&mut self, roster: &[DerivedPerson]) -> Vec<PersonId> {
        let mut rising = Vec::new();

        for person in roster {
            let now_overdue = is_overdue(person.days_since, self.threshold_days);
            let previously = self.was_overdue(&person.id);

            if now_overdue && !previously {
                info!(
                    person_id = %person.id,
                    days_since = ?person.days_since,
                    "Person became overdue"
                );
                rising.push(person.id.clone());
            }

            self.snapshot.insert(person.id.clone(), now_overdue);
        }

        debug!(
            checked = roster.len(),
            rising = rising.len(),
            tracked = self.snapshot.len(),
            "Overdue check complete"
        );
        rising
    }
}

impl Default for OverdueDetector {
    fn default() -> Self {
        Self::new()
    }
}
