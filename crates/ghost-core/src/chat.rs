//! Chat threads as reported by the chat platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier of a chat thread.
///
/// Opaque string handed out by the chat platform. Unique across direct
/// messages and groups, and never reassigned once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ChatId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Network
// ============================================================================

/// Messaging network a thread belongs to.
///
/// Derived from the platform account identifier, so "Other" covers any
/// bridge we do not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Network {
    Instagram,
    WhatsApp,
    Telegram,
    Signal,
    #[serde(rename = "iMessage")]
    IMessage,
    Messenger,
    Discord,
    Slack,
    LinkedIn,
    X,
    #[serde(rename = "Google Messages")]
    GoogleMessages,
    #[default]
    #[serde(other)]
    Other,
}

/// Keyword table scanned in order; first hit wins.
const ACCOUNT_KEYWORDS: &[(&str, Network)] = &[
    ("instagram", Network::Instagram),
    ("whatsapp", Network::WhatsApp),
    ("telegram", Network::Telegram),
    ("signal", Network::Signal),
    ("imessage", Network::IMessage),
    ("apple", Network::IMessage),
    ("messenger", Network::Messenger),
    ("facebook", Network::Messenger),
    ("discord", Network::Discord),
    ("slack", Network::Slack),
    ("linkedin", Network::LinkedIn),
    ("twitter", Network::X),
    ("x.com", Network::X),
    ("googlemessages", Network::GoogleMessages),
    ("rcs", Network::GoogleMessages),
];

impl Network {
    /// Identifies the network from a platform account id such as
    /// `"whatsapp-1234"` or `"local-instagram_ba_xyz"`.
    pub fn from_account_id(account_id: &str) -> Self {
        let account = account_id.to_lowercase();
        ACCOUNT_KEYWORDS
            .iter()
            .find(|(keyword, _)| account.contains(keyword))
            .map(|(_, network)| *network)
            .unwrap_or(Self::Other)
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::WhatsApp => "WhatsApp",
            Self::Telegram => "Telegram",
            Self::Signal => "Signal",
            Self::IMessage => "iMessage",
            Self::Messenger => "Messenger",
            Self::Discord => "Discord",
            Self::Slack => "Slack",
            Self::LinkedIn => "LinkedIn",
            Self::X => "X",
            Self::GoogleMessages => "Google Messages",
            Self::Other => "Other",
        }
    }

    /// Avatar preference when several linked chats carry a picture.
    /// Lower wins.
    pub fn avatar_priority(&self) -> u8 {
        match self {
            Self::Instagram => 0,
            Self::WhatsApp => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Chat Record
// ============================================================================

/// A visible participant of a group thread.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_member_count() -> u32 {
    1
}

/// A single chat thread (direct or group).
///
/// `id` is the identity; everything else may change between reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: ChatId,

    #[serde(default)]
    pub name: Option<String>,

    /// Username, handle or phone number of the other party
    #[serde(default)]
    pub handle: Option<String>,

    #[serde(default)]
    pub network: Network,

    /// Opaque image reference, see [`crate::AvatarRef`]
    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub is_group: bool,

    /// Number of other participants (1 for direct messages)
    #[serde(default = "default_member_count")]
    pub member_count: u32,

    #[serde(default)]
    pub members: Vec<GroupMember>,

    /// Days since the last message that counts toward cadence; `None` when unknown
    #[serde(default)]
    pub days_since: Option<u32>,

    /// Days since anyone wrote in the thread
    #[serde(default)]
    pub last_activity_days: Option<u32>,

    #[serde(default)]
    pub last_message_ts: Option<DateTime<Utc>>,

    /// Whether the user sent the latest message
    #[serde(default)]
    pub i_sent_last: bool,

    #[serde(default)]
    pub preview: String,
}

impl ChatRecord {
    /// Creates a direct-message record with only the identity set.
    pub fn direct(id: impl Into<ChatId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            handle: None,
            network: Network::Other,
            avatar: None,
            is_group: false,
            member_count: 1,
            members: Vec::new(),
            days_since: None,
            last_activity_days: None,
            last_message_ts: None,
            i_sent_last: false,
            preview: String::new(),
        }
    }

    /// Creates a group record with `member_count` other participants.
    pub fn group(id: impl Into<ChatId>, name: impl Into<String>, member_count: u32) -> Self {
        Self {
            is_group: true,
            member_count,
            ..Self::direct(id, name)
        }
    }

    /// Builder-style setter for `days_since`.
    #[must_use]
    pub fn with_days_since(mut self, days_since: Option<u32>) -> Self {
        self.days_since = days_since;
        self
    }

    /// Builder-style setter for `handle`.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Builder-style setter for `network`.
    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Name, or empty when missing.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Handle, or empty when missing.
    pub fn handle_or_empty(&self) -> &str {
        self.handle.as_deref().unwrap_or("")
    }

    /// Groups where only one other participant is visible are never
    /// offered for linking.
    #[must_use]
    pub fn is_linkable(&self) -> bool {
        !self.is_group || self.member_count > 1
    }

    /// Short recency label for list display.
    pub fn days_label(&self) -> String {
        days_label(self.days_since)
    }
}

/// Formats a recency value: "—", "today", "yesterday" or "{n}d".
pub fn days_label(days_since: Option<u32>) -> String {
    match days_since {
        None => "—".to_string(),
        Some(0) => "today".to_string(),
        Some(1) => "yesterday".to_string(),
        Some(n) => format!("{n}d"),
    }
}

// ============================================================================
// Chat Pool
// ============================================================================

/// Every chat the platform reported in one load, split into direct
/// messages and groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatPool {
    #[serde(default)]
    pub contacts: Vec<ChatRecord>,
    #[serde(default)]
    pub groups: Vec<ChatRecord>,
}

impl ChatPool {
    pub fn new(contacts: Vec<ChatRecord>, groups: Vec<ChatRecord>) -> Self {
        Self { contacts, groups }
    }

    /// Partitions records by their `is_group` flag, keeping input order.
    pub fn from_records(records: impl IntoIterator<Item = ChatRecord>) -> Self {
        let (groups, contacts): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.is_group);
        Self { contacts, groups }
    }

    /// All records, direct messages first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatRecord> {
        self.contacts.iter().chain(self.groups.iter())
    }

    pub fn len(&self) -> usize {
        self.contacts.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.groups.is_empty()
    }

    /// Ids of every group thread.
    pub fn group_ids(&self) -> HashSet<&ChatId> {
        self.groups.iter().map(|g| &g.id).collect()
    }

    /// Builds an id lookup over the whole pool.
    pub fn index(&self) -> ChatIndex<'_> {
        ChatIndex::new(self.iter())
    }
}

/// Borrowed id → record lookup.
#[derive(Debug, Clone, Default)]
pub struct ChatIndex<'a> {
    by_id: HashMap<&'a ChatId, &'a ChatRecord>,
}

impl<'a> ChatIndex<'a> {
    /// Indexes records; on duplicate ids the first occurrence wins.
    pub fn new(records: impl IntoIterator<Item = &'a ChatRecord>) -> Self {
        let mut by_id = HashMap::new();
        for record in records {
            by_id.entry(&record.id).or_insert(record);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &ChatId) -> Option<&'a ChatRecord> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_account_id() {
        assert_eq!(Network::from_account_id("local-whatsapp_ba_123"), Network::WhatsApp);
        assert_eq!(Network::from_account_id("Instagram"), Network::Instagram);
        assert_eq!(Network::from_account_id("facebookgo"), Network::Messenger);
        assert_eq!(Network::from_account_id("apple-sms"), Network::IMessage);
        assert_eq!(Network::from_account_id("rcs-bridge"), Network::GoogleMessages);
        assert_eq!(Network::from_account_id("matrix"), Network::Other);
        assert_eq!(Network::from_account_id(""), Network::Other);
    }

    #[test]
    fn test_network_serialization_uses_labels() {
        let json = serde_json::to_string(&Network::GoogleMessages).unwrap();
        assert_eq!(json, "\"Google Messages\"");
        let parsed: Network = serde_json::from_str("\"iMessage\"").unwrap();
        assert_eq!(parsed, Network::IMessage);
        let unknown: Network = serde_json::from_str("\"Beeper\"").unwrap();
        assert_eq!(unknown, Network::Other);
    }

    #[test]
    fn test_chat_record_lenient_parse() {
        let record: ChatRecord = serde_json::from_str(r#"{"id": "c1"}"#).unwrap();
        assert_eq!(record.id.as_str(), "c1");
        assert_eq!(record.name_or_empty(), "");
        assert_eq!(record.member_count, 1);
        assert_eq!(record.days_since, None);
        assert!(!record.is_group);
    }

    #[test]
    fn test_linkable_groups() {
        assert!(ChatRecord::direct("d", "Dana").is_linkable());
        assert!(ChatRecord::group("g2", "Trip", 2).is_linkable());
        assert!(!ChatRecord::group("g1", "Just one", 1).is_linkable());
    }

    #[test]
    fn test_days_label() {
        assert_eq!(days_label(None), "—");
        assert_eq!(days_label(Some(0)), "today");
        assert_eq!(days_label(Some(1)), "yesterday");
        assert_eq!(days_label(Some(12)), "12d");
    }

    #[test]
    fn test_pool_partition_and_index() {
        let pool = ChatPool::from_records(vec![
            ChatRecord::direct("a", "Ann"),
            ChatRecord::group("g", "Crew", 3),
            ChatRecord::direct("b", "Ben"),
        ]);
        assert_eq!(pool.contacts.len(), 2);
        assert_eq!(pool.groups.len(), 1);
        assert!(pool.group_ids().contains(&ChatId::new("g")));

        let index = pool.index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&ChatId::new("b")).map(|r| r.name_or_empty()), Some("Ben"));
        assert!(index.get(&ChatId::new("zzz")).is_none());
    }
}
