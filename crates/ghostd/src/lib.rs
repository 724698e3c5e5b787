//! ghostd - the local contacts service
//!
//! This crate serves the dashboard and the watcher from a data directory:
//! - `config` - TOML configuration with environment overrides
//! - `store` - the `settings.json` document (whole-document saves)
//! - `source` - the `chats.json` snapshot behind a TTL cache
//! - `service` - the `ContactsService` contract and `LocalService`
//! - `avatar` - resolution of proxied avatar references
//! - `notify` - notification sink
//! - `watcher` - periodic refresh and overdue notifications
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  people(bust)  ┌──────────────┐  load   ┌───────────────┐
//! │   Watcher    │───────────────▶│ LocalService │────────▶│ SettingsStore │
//! │ (interval +  │                │              │         └───────────────┘
//! │  mpsc + tok) │                │              │  pool   ┌───────────────┐
//! └──────┬───────┘                └──────────────┘────────▶│  ChatSource   │
//!        │ rising edges                                    │ (TTL cache)   │
//!        ▼                                                 └───────────────┘
//! ┌──────────────┐
//! │   Notifier   │
//! └──────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()` or `todo!()`
//! in production code. I/O failures surface as `ServiceError`.

pub mod avatar;
pub mod config;
pub mod error;
pub mod notify;
pub mod service;
pub mod source;
pub mod store;
pub mod watcher;

pub use avatar::AvatarResponse;
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use notify::{LogNotifier, Notification, Notifier};
pub use service::{ContactsService, LocalService};
pub use source::ChatSource;
pub use store::SettingsStore;
pub use watcher::{spawn_watcher, RefreshOutcome, RefreshRequest, Watcher};
