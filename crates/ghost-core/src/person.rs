//! Tracked people and their dashboard projection.

use crate::chat::{ChatId, ChatRecord, Network};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Prefix of generated person ids.
pub const PERSON_ID_PREFIX: &str = "p_";

/// Unique identifier for a tracked person.
///
/// Generated once when the person is created and kept across every edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id of the form `p_<unix-millis>_<random>`.
    pub fn generate() -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(10).collect();
        Self(format!(
            "{PERSON_ID_PREFIX}{}_{suffix}",
            Utc::now().timestamp_millis()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Person
// ============================================================================

/// A tracked individual and the chat threads linked to them.
///
/// `chat_ids` keeps insertion order for display; order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub chat_ids: Vec<ChatId>,
}

impl Person {
    /// Creates a person with a freshly generated id and no links.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_id(PersonId::generate(), display_name)
    }

    /// Creates a person with a known id and no links.
    pub fn with_id(id: impl Into<PersonId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            chat_ids: Vec::new(),
        }
    }

    /// Returns true if the display name is non-blank.
    #[must_use]
    pub fn has_display_name(&self) -> bool {
        !self.display_name.trim().is_empty()
    }

    #[must_use]
    pub fn is_linked(&self, chat_id: &ChatId) -> bool {
        self.chat_ids.contains(chat_id)
    }

    /// Links a chat thread. Returns false if it was already linked.
    pub fn link(&mut self, chat_id: ChatId) -> bool {
        if self.is_linked(&chat_id) {
            return false;
        }
        self.chat_ids.push(chat_id);
        true
    }

    /// Unlinks a chat thread. Returns false if it was not linked.
    pub fn unlink(&mut self, chat_id: &ChatId) -> bool {
        let before = self.chat_ids.len();
        self.chat_ids.retain(|id| id != chat_id);
        self.chat_ids.len() != before
    }
}

// ============================================================================
// Urgency
// ============================================================================

/// Ordinal urgency bucket, 0 (cold) to 5 (talked within a day).
///
/// Higher means fresher contact, so the dashboard can colour by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urgency(u8);

impl Urgency {
    pub const MAX: Urgency = Urgency(5);

    pub fn new(level: u8) -> Self {
        Self(level.min(Self::MAX.0))
    }

    /// Buckets a recency signal.
    pub fn from_signal(days_since: Option<u32>, waiting_on_you: bool) -> Self {
        let level = match days_since {
            None if waiting_on_you => 3,
            None => 0,
            Some(0..=1) => 5,
            Some(2..=7) => 4,
            Some(8..=13) => 3,
            Some(14..=30) => 2,
            Some(31..=90) => 1,
            Some(_) => 0,
        };
        Self(level)
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

// ============================================================================
// Derived Person
// ============================================================================

/// Dashboard projection of a [`Person`].
///
/// Recomputed in full on every roster reload; only `id` carries identity
/// from one reload to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedPerson {
    pub id: PersonId,

    #[serde(default)]
    pub display_name: String,

    /// Most recent activity across linked chats; `None` when unknown
    #[serde(default)]
    pub days_since: Option<u32>,

    #[serde(default)]
    pub last_message_ts: Option<DateTime<Utc>>,

    /// The other party sent the last message and it has not been answered
    #[serde(default)]
    pub waiting_on_you: bool,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(default)]
    pub networks: Vec<Network>,

    #[serde(default)]
    pub preview: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub linked_chats: Vec<ChatRecord>,
}

impl DerivedPerson {
    /// Projection for a person with no resolvable chats.
    pub fn without_activity(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            display_name: person.display_name.clone(),
            days_since: None,
            last_message_ts: None,
            waiting_on_you: false,
            urgency: Urgency::default(),
            networks: Vec::new(),
            preview: String::new(),
            avatar: None,
            linked_chats: Vec::new(),
        }
    }

    /// Linked groups that have more than one other member.
    pub fn shared_groups(&self) -> impl Iterator<Item = &ChatRecord> {
        self.linked_chats
            .iter()
            .filter(|c| c.is_group && c.member_count > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = PersonId::generate();
        let b = PersonId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(PERSON_ID_PREFIX));
    }

    #[test]
    fn test_link_and_unlink_are_idempotent() {
        let mut person = Person::with_id("p1", "Sam");
        assert!(person.link(ChatId::new("c1")));
        assert!(!person.link(ChatId::new("c1")));
        assert!(person.link(ChatId::new("c2")));
        assert_eq!(person.chat_ids, vec![ChatId::new("c1"), ChatId::new("c2")]);

        assert!(person.unlink(&ChatId::new("c1")));
        assert!(!person.unlink(&ChatId::new("c1")));
        assert_eq!(person.chat_ids, vec![ChatId::new("c2")]);
    }

    #[test]
    fn test_blank_display_name() {
        assert!(!Person::with_id("p1", "   ").has_display_name());
        assert!(Person::with_id("p1", "Jo").has_display_name());
    }

    #[test]
    fn test_urgency_buckets() {
        assert_eq!(Urgency::from_signal(None, false).level(), 0);
        assert_eq!(Urgency::from_signal(None, true).level(), 3);
        assert_eq!(Urgency::from_signal(Some(0), false).level(), 5);
        assert_eq!(Urgency::from_signal(Some(1), false).level(), 5);
        assert_eq!(Urgency::from_signal(Some(7), false).level(), 4);
        assert_eq!(Urgency::from_signal(Some(13), false).level(), 3);
        assert_eq!(Urgency::from_signal(Some(14), false).level(), 2);
        assert_eq!(Urgency::from_signal(Some(30), false).level(), 2);
        assert_eq!(Urgency::from_signal(Some(90), false).level(), 1);
        assert_eq!(Urgency::from_signal(Some(91), true).level(), 0);
    }

    #[test]
    fn test_derived_person_parses_backend_payload() {
        let json = r#"{
            "id": "p_1",
            "display_name": "Alex",
            "days_since": null,
            "networks": ["WhatsApp"],
            "preview": "",
            "avatar": null,
            "urgency": 0
        }"#;
        let person: DerivedPerson = serde_json::from_str(json).unwrap();
        assert_eq!(person.days_since, None);
        assert!(!person.waiting_on_you);
        assert_eq!(person.networks, vec![Network::WhatsApp]);
    }
}
