//! Link registry: which chat threads belong to which tracked person.
//!
//! A direct-message thread belongs to at most one person. Group threads
//! may be linked to several people, since linking a group only borrows
//! its recency signal and member list.
//!
//! Whether an id is a group is decided by the chat pool: ids that show up
//! among the pool's groups are groups, everything else (including ids the
//! pool does not know) is treated as a direct message and stays exclusive.

use crate::chat::{ChatId, ChatPool};
use crate::person::{Person, PersonId};
use std::collections::{HashMap, HashSet};

/// Direct-message ids already claimed by someone other than `exclude`.
pub fn linked_direct_message_ids<'a>(
    roster: &'a [Person],
    pool: &ChatPool,
    exclude: Option<&PersonId>,
) -> HashSet<&'a ChatId> {
    let group_ids = pool.group_ids();
    roster
        .iter()
        .filter(|p| Some(&p.id) != exclude)
        .flat_map(|p| p.chat_ids.iter())
        .filter(|id| !group_ids.contains(id))
        .collect()
}

/// Finds the person holding a given chat, if any.
pub fn owner_of<'a>(roster: &'a [Person], chat_id: &ChatId) -> Option<&'a Person> {
    roster.iter().find(|p| p.is_linked(chat_id))
}

/// Direct-message ids linked to more than one person.
///
/// Empty for any roster built through the candidate resolver.
pub fn exclusivity_violations<'a>(roster: &'a [Person], pool: &ChatPool) -> Vec<&'a ChatId> {
    let group_ids = pool.group_ids();
    let mut owners: HashMap<&ChatId, usize> = HashMap::new();
    for person in roster {
        let distinct: HashSet<&ChatId> = person.chat_ids.iter().collect();
        for id in distinct {
            if !group_ids.contains(id) {
                *owners.entry(id).or_insert(0) += 1;
            }
        }
    }
    let mut violations: Vec<&ChatId> = owners
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    violations.sort();
    violations
}
