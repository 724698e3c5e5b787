//! Projection of a person onto the chats they are linked to.
//!
//! Most-recent-wins: the person's `days_since` is the smallest known
//! value across linked chats, and the chat holding it ("freshest") also
//! supplies `waiting_on_you`, the preview and the last message time.

use crate::chat::{ChatIndex, ChatRecord, Network};
use crate::person::{DerivedPerson, Person, Urgency};

/// A reply is only considered owed if the thread saw activity this recently.
pub const WAITING_WINDOW_DAYS: u32 = 30;

/// Builds the dashboard projection of `person`.
///
/// Linked ids missing from `index` are skipped without complaint.
pub fn derive_person(person: &Person, index: &ChatIndex<'_>) -> DerivedPerson {
    let chats: Vec<&ChatRecord> = person
        .chat_ids
        .iter()
        .filter_map(|id| index.get(id))
        .collect();

    if chats.is_empty() {
        return DerivedPerson::without_activity(person);
    }

    // min_by_key keeps the first of equal minima
    let freshest = chats
        .iter()
        .copied()
        .filter(|c| c.days_since.is_some())
        .min_by_key(|c| c.days_since);
    let days_since = freshest.and_then(|c| c.days_since);

    let waiting_on_you = freshest.is_some_and(|c| {
        !c.i_sent_last && c.last_activity_days.unwrap_or(999) < WAITING_WINDOW_DAYS
    });

    let mut networks: Vec<Network> = Vec::new();
    for chat in &chats {
        if !networks.contains(&chat.network) {
            networks.push(chat.network);
        }
    }

    let mut by_priority = chats.clone();
    by_priority.sort_by_key(|c| c.network.avatar_priority());
    let avatar = by_priority.iter().find_map(|c| c.avatar.clone());

    let preview = match freshest {
        Some(chat) => chat.preview.clone(),
        None => chats
            .iter()
            .map(|c| c.preview.as_str())
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string(),
    };

    DerivedPerson {
        id: person.id.clone(),
        display_name: person.display_name.clone(),
        days_since,
        last_message_ts: freshest.and_then(|c| c.last_message_ts),
        waiting_on_you,
        urgency: Urgency::from_signal(days_since, waiting_on_you),
        networks,
        preview,
        avatar,
        linked_chats: chats.into_iter().cloned().collect(),
    }
}
