//! ghostwatch Protocol - Contacts service payloads
//!
//! This crate provides the request/response documents exchanged with the
//! contacts service (settings, raw contacts, derived people, status) and
//! the parsing of chat JSON exported by the chat platform.

pub mod error;
pub mod message;
pub mod parse;

pub use error::{ProtocolError, ProtocolResult};
pub use message::{ContactsResponse, PeopleResponse, SaveResponse, StatusResponse};
pub use parse::{
    build_pool, dedup_chats, parse_snapshot, parse_timestamp, RawChat, RawParticipant,
    RawParticipants, RawPreview, RawTimestamp,
};
