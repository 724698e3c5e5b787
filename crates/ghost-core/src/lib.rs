//! ghostwatch Core - Domain types and engines for conversational cadence
//!
//! This crate provides the pure, synchronous logic shared between the
//! contacts service (ghostd) and the `ghostwatch` CLI:
//!
//! - `matching` - scores and ranks chat records against a free-text query
//! - `registry` - many-to-one mapping of chat threads to tracked people
//! - `candidates` - the "still linkable" chat list for one person
//! - `ranking` - dashboard ordering by neglect
//! - `overdue` - rising-edge detection for ghosting notifications
//!
//! Nothing in here performs I/O.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod avatar;
pub mod candidates;
pub mod chat;
pub mod derive;
pub mod error;
pub mod matching;
pub mod overdue;
pub mod person;
pub mod ranking;
pub mod registry;
pub mod settings;

// Re-exports for convenience
pub use avatar::{initials, AvatarRef};
pub use candidates::{candidates, link_offered};
pub use chat::{days_label, ChatId, ChatIndex, ChatPool, ChatRecord, GroupMember, Network};
pub use derive::derive_person;
pub use error::{DomainError, DomainResult};
pub use matching::{rank as rank_chats, score, search_log};
pub use overdue::{is_overdue, OverdueDetector, OVERDUE_THRESHOLD_DAYS};
pub use person::{DerivedPerson, Person, PersonId, Urgency};
pub use ranking::{rank as rank_people, RosterStats};
pub use registry::{exclusivity_violations, linked_direct_message_ids, owner_of};
pub use settings::Settings;
