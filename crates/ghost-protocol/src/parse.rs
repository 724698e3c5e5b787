//! Parsing chat JSON exported by the chat platform.
//!
//! Field names vary between bridges, so almost everything is optional and
//! several aliases are accepted. Anything we cannot make sense of turns
//! into "unknown" rather than an error.

use crate::error::ProtocolResult;
use chrono::{DateTime, NaiveDateTime, Utc};
use ghost_core::{ChatId, ChatPool, ChatRecord, GroupMember, Network};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use tracing::debug;

/// Longest preview kept, in characters.
pub const PREVIEW_MAX_CHARS: usize = 60;

/// Numbers above this are milliseconds, below are seconds.
const MILLIS_CUTOFF: f64 = 1e12;

/// Raw chat entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChat {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// "group" for group threads; anything else is direct
    #[serde(default, rename = "type")]
    pub chat_type: Option<String>,
    #[serde(default, rename = "accountID", alias = "account_id")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub participants: Option<RawParticipants>,
    #[serde(default)]
    pub preview: Option<RawPreview>,
    #[serde(default)]
    pub last_activity: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParticipants {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<RawParticipant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipant {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default, rename = "imgURL")]
    pub img_url: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, alias = "is_self", deserialize_with = "null_as_default")]
    pub is_self: bool,
}

impl RawParticipant {
    fn best_name(&self) -> Option<String> {
        first_present([&self.full_name, &self.name, &self.display_name])
    }

    fn best_avatar(&self) -> Option<String> {
        first_present([&self.img_url, &self.avatar])
    }

    fn to_member(&self) -> GroupMember {
        GroupMember {
            name: self.best_name(),
            handle: first_present([&self.username, &self.handle]),
            avatar: self.best_avatar(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPreview {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_sender: bool,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Timestamp as either epoch number or ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(f64),
    Text(String),
}

/// Page of chats as returned by the platform's chat listing.
///
/// Entries stay untyped so one malformed chat cannot sink the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    List(Vec<serde_json::Value>),
    Page { items: Vec<serde_json::Value> },
}

/// Reads an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// First non-empty value.
fn first_present<const N: usize>(candidates: [&Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
}

/// Parses a timestamp; `None` when it is not understood.
///
/// Numbers above 1e12 are read as milliseconds. Text accepts RFC 3339
/// (including a trailing `Z`) and naive date-times, read as UTC.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Epoch(n) if *n > MILLIS_CUTOFF => DateTime::from_timestamp_millis(*n as i64),
        RawTimestamp::Epoch(n) => DateTime::from_timestamp(*n as i64, 0),
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
    }
}

/// Whole days from `ts` to `now`; future timestamps count as 0.
fn whole_days(ts: DateTime<Utc>, now: DateTime<Utc>) -> Option<u32> {
    u32::try_from(now.signed_duration_since(ts).num_days().max(0)).ok()
}

fn truncate_preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_MAX_CHARS {
        let mut short: String = text.chars().take(PREVIEW_MAX_CHARS).collect();
        short.push('…');
        short
    } else {
        text.to_string()
    }
}

impl RawChat {
    /// True when the platform marks the chat as a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.chat_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("group"))
    }

    /// Participants other than the user.
    fn others(&self) -> Vec<&RawParticipant> {
        self.participants
            .iter()
            .flat_map(|p| p.items.iter())
            .filter(|p| !p.is_self)
            .collect()
    }

    /// Converts to a [`ChatRecord`] as of `now`. Returns `None` without an id.
    ///
    /// `days_since` is measured from the preview timestamp when the user
    /// sent the latest message, otherwise from the last activity.
    pub fn to_chat_record(&self, now: DateTime<Utc>) -> Option<ChatRecord> {
        let id = self.id.as_deref().filter(|id| !id.is_empty())?;
        let is_group = self.is_group();
        let others = self.others();
        let network = Network::from_account_id(self.account_id.as_deref().unwrap_or(""));

        let mut name = first_present([&self.name, &self.title]);
        let mut avatar = self.avatar.clone().filter(|a| !a.is_empty());
        let mut handle = None;

        let first_other = others.first().copied();
        if let (false, Some(other)) = (is_group, first_other) {
            name = name.or_else(|| other.best_name());
            avatar = avatar.or_else(|| other.best_avatar());
            handle = first_present([&other.username, &other.handle, &other.phone_number]);
        }

        let preview = self.preview.clone().unwrap_or_default();
        let last_activity = self.last_activity.as_ref().and_then(parse_timestamp);
        let reference = if preview.is_sender {
            preview.timestamp.as_ref().and_then(parse_timestamp)
        } else {
            last_activity
        };

        let (members, member_count) = if is_group {
            let members: Vec<GroupMember> = others.iter().map(|p| p.to_member()).collect();
            let count = u32::try_from(members.len()).unwrap_or(u32::MAX);
            (members, count)
        } else {
            (Vec::new(), 1)
        };

        Some(ChatRecord {
            id: ChatId::new(id),
            name: Some(name.unwrap_or_else(|| "Unknown".to_string())),
            handle,
            network,
            avatar,
            is_group,
            member_count,
            members,
            days_since: reference.and_then(|ts| whole_days(ts, now)),
            last_activity_days: last_activity.and_then(|ts| whole_days(ts, now)),
            last_message_ts: reference,
            i_sent_last: preview.is_sender,
            preview: truncate_preview(preview.text.as_deref().unwrap_or("")),
        })
    }
}

/// Parses a snapshot: either a bare array of chats or a page with `items`.
///
/// Entries that do not look like a chat are skipped.
///
/// # Errors
///
/// `ProtocolError::Json` when the document itself is not JSON or is
/// neither an array nor a page.
pub fn parse_snapshot(json: &str) -> ProtocolResult<Vec<RawChat>> {
    let entries = match serde_json::from_str(json)? {
        RawSnapshot::List(entries) => entries,
        RawSnapshot::Page { items } => items,
    };
    let total = entries.len();
    let chats: Vec<RawChat> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| match serde_json::from_value(entry) {
            Ok(chat) => Some(chat),
            Err(e) => {
                debug!(position, error = %e, "Skipping malformed chat");
                None
            }
        })
        .collect();
    if chats.len() != total {
        debug!(fetched = total, parsed = chats.len(), "Dropped malformed chats");
    }
    Ok(chats)
}

/// Drops chats without an id and repeated ids; first occurrence wins.
pub fn dedup_chats(chats: Vec<RawChat>) -> Vec<RawChat> {
    let total = chats.len();
    let mut seen = HashSet::new();
    let unique: Vec<RawChat> = chats
        .into_iter()
        .filter(|c| match c.id.as_deref() {
            Some(id) if !id.is_empty() => seen.insert(id.to_string()),
            _ => false,
        })
        .collect();
    debug!(fetched = total, unique = unique.len(), "Deduplicated chats");
    unique
}

/// Converts unique raw chats into a pool split by group flag.
pub fn build_pool(chats: &[RawChat], now: DateTime<Utc>) -> ChatPool {
    ChatPool::from_records(chats.iter().filter_map(|c| c.to_chat_record(now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn chat(json: &str) -> RawChat {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let secs = expected.timestamp() as f64;
        let millis = expected.timestamp_millis() as f64;

        assert_eq!(parse_timestamp(&RawTimestamp::Epoch(secs)), Some(expected));
        assert_eq!(parse_timestamp(&RawTimestamp::Epoch(millis)), Some(expected));
        assert_eq!(
            parse_timestamp(&RawTimestamp::Text("2025-03-01T00:00:00Z".to_string())),
            Some(expected)
        );
        assert_eq!(
            parse_timestamp(&RawTimestamp::Text("2025-03-01T00:00:00.000".to_string())),
            Some(expected)
        );
        assert_eq!(parse_timestamp(&RawTimestamp::Text("yesterday".to_string())), None);
    }

    #[test]
    fn test_direct_chat_falls_back_to_participant() {
        let raw = chat(
            r#"{
                "id": "!dm:beeper.local",
                "type": "single",
                "accountID": "whatsapp",
                "participants": {"items": [
                    {"fullName": "Me", "isSelf": true},
                    {"fullName": "Noor Haddad", "phoneNumber": "+15550100", "imgURL": "mxc://b/n"}
                ]},
                "preview": {"isSender": true, "timestamp": "2025-03-10T12:00:00Z", "text": "see you"},
                "lastActivity": "2025-03-18T12:00:00Z"
            }"#,
        );
        let record = raw.to_chat_record(now()).unwrap();
        assert_eq!(record.name.as_deref(), Some("Noor Haddad"));
        assert_eq!(record.handle.as_deref(), Some("+15550100"));
        assert_eq!(record.avatar.as_deref(), Some("mxc://b/n"));
        assert_eq!(record.network, Network::WhatsApp);
        assert!(!record.is_group);
        assert_eq!(record.member_count, 1);
        // user sent last, so the preview timestamp counts
        assert_eq!(record.days_since, Some(10));
        assert_eq!(record.last_activity_days, Some(2));
        assert!(record.i_sent_last);
        assert_eq!(record.preview, "see you");
    }

    #[test]
    fn test_reply_pending_uses_last_activity() {
        let last = now() - Duration::days(3);
        let raw = chat(&format!(
            r#"{{"id": "c", "preview": {{"isSender": false}}, "lastActivity": {}}}"#,
            last.timestamp_millis()
        ));
        let record = raw.to_chat_record(now()).unwrap();
        assert_eq!(record.days_since, Some(3));
        assert!(!record.i_sent_last);
        assert_eq!(record.name.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_group_members() {
        let raw = chat(
            r#"{
                "id": "g1",
                "title": "Book club",
                "type": "group",
                "participants": {"items": [
                    {"name": "Me", "is_self": true},
                    {"displayName": "Ivy", "username": "ivy"},
                    {"fullName": "Otto"}
                ]}
            }"#,
        );
        let record = raw.to_chat_record(now()).unwrap();
        assert!(record.is_group);
        assert_eq!(record.name.as_deref(), Some("Book club"));
        assert_eq!(record.member_count, 2);
        assert_eq!(record.members[0].name.as_deref(), Some("Ivy"));
        assert_eq!(record.members[0].handle.as_deref(), Some("ivy"));
        assert_eq!(record.handle, None);
        assert_eq!(record.days_since, None);
    }

    #[test]
    fn test_preview_truncated() {
        let long = "x".repeat(75);
        let raw = chat(&format!(r#"{{"id": "c", "preview": {{"text": "{long}"}}}}"#));
        let record = raw.to_chat_record(now()).unwrap();
        assert_eq!(record.preview.chars().count(), PREVIEW_MAX_CHARS + 1);
        assert!(record.preview.ends_with('…'));
    }

    #[test]
    fn test_missing_id_dropped() {
        assert!(chat(r#"{"name": "ghost"}"#).to_chat_record(now()).is_none());
    }

    #[test]
    fn test_snapshot_shapes_and_dedup() {
        let list = parse_snapshot(r#"[{"id": "a"}, {"id": "b"}, {"id": "a", "name": "dup"}, {}]"#)
            .unwrap();
        assert_eq!(list.len(), 4);
        let unique = dedup_chats(list);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, None);

        let page = parse_snapshot(r#"{"items": [{"id": "x"}], "hasMore": false}"#).unwrap();
        assert_eq!(page.len(), 1);

        assert!(parse_snapshot("not json").is_err());
        assert!(parse_snapshot(r#""just a string""#).is_err());
    }

    #[test]
    fn test_null_flags_read_as_false() {
        let raw = chat(
            r#"{
                "id": "c",
                "participants": {"items": [{"fullName": "Remy", "isSelf": null}]},
                "preview": {"isSender": null, "text": "hi"}
            }"#,
        );
        let record = raw.to_chat_record(now()).unwrap();
        assert!(!record.i_sent_last);
        assert_eq!(record.name.as_deref(), Some("Remy"));

        let empty = chat(r#"{"id": "g", "type": "group", "participants": {"items": null}}"#);
        assert_eq!(empty.to_chat_record(now()).unwrap().member_count, 0);
    }

    #[test]
    fn test_malformed_chat_does_not_sink_snapshot() {
        let chats = parse_snapshot(
            r#"[
                {"id": "good", "name": "Ada", "preview": {"isSender": true}},
                {"id": "nulls", "preview": {"isSender": null}},
                {"id": "typo", "name": 42},
                "not a chat",
                {"id": "also-good", "participants": {"items": [{"isSelf": null}]}}
            ]"#,
        )
        .unwrap();
        let ids: Vec<&str> = chats.iter().filter_map(|c| c.id.as_deref()).collect();
        assert_eq!(ids, vec!["good", "nulls", "also-good"]);
        assert!(chats[0].preview.as_ref().unwrap().is_sender);

        let page = parse_snapshot(r#"{"items": [{"id": 7}, {"id": "ok"}]}"#).unwrap();
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn test_build_pool_splits_groups() {
        let chats = dedup_chats(
            parse_snapshot(r#"[{"id": "a"}, {"id": "g", "type": "group"}]"#).unwrap(),
        );
        let pool = build_pool(&chats, now());
        assert_eq!(pool.contacts.len(), 1);
        assert_eq!(pool.groups.len(), 1);
    }
}
