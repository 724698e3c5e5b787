//! The contacts service contract and its file-backed implementation.

use crate::avatar::{resolve_avatar, AvatarResponse};
use crate::config::Config;
use crate::error::ServiceResult;
use crate::source::ChatSource;
use crate::store::SettingsStore;
use async_trait::async_trait;
use ghost_core::{derive_person, exclusivity_violations, DerivedPerson, Settings};
use ghost_protocol::{ContactsResponse, PeopleResponse, SaveResponse, StatusResponse};
use tracing::{debug, warn};

// ============================================================================
// Contract
// ============================================================================

/// Operations the dashboard and the watcher need from the backend.
///
/// `Err` from any method is a transport failure. Application errors from
/// `people` come back inside [`PeopleResponse::Error`] instead.
#[async_trait]
pub trait ContactsService: Send + Sync {
    async fn settings(&self) -> ServiceResult<Settings>;

    /// Replaces the whole settings document.
    async fn save_settings(&self, settings: Settings) -> ServiceResult<SaveResponse>;

    /// Every known chat, split into direct messages and groups.
    async fn contacts_raw(&self) -> ServiceResult<ContactsResponse>;

    /// Derived people, most stale first. `bust` skips the chat cache.
    async fn people(&self, bust: bool) -> ServiceResult<PeopleResponse>;

    async fn status(&self) -> StatusResponse;

    async fn resolve_avatar(&self, path: &str) -> ServiceResult<AvatarResponse>;
}

// ============================================================================
// Local implementation
// ============================================================================

/// Serves everything from the data directory.
#[derive(Debug)]
pub struct LocalService {
    store: SettingsStore,
    source: ChatSource,
    platform_base_url: String,
}

impl LocalService {
    pub fn new(store: SettingsStore, source: ChatSource, platform_base_url: impl Into<String>) -> Self {
        Self {
            store,
            source,
            platform_base_url: platform_base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SettingsStore::new(config.settings_path()),
            ChatSource::new(config.snapshot_path(), config.cache_ttl()),
            config.platform_base_url.clone(),
        )
    }
}

/// Backend order: known `days_since` descending, unknown last.
fn backend_order(people: &mut [DerivedPerson]) {
    people.sort_by(|a, b| b.days_since.cmp(&a.days_since));
}

#[async_trait]
impl ContactsService for LocalService {
    async fn settings(&self) -> ServiceResult<Settings> {
        self.store.load().await
    }

    async fn save_settings(&self, settings: Settings) -> ServiceResult<SaveResponse> {
        if let Ok(pool) = self.source.pool(false).await {
            let shared = exclusivity_violations(&settings.people, &pool);
            if !shared.is_empty() {
                warn!(chat_ids = ?shared, "Direct messages linked to more than one person");
            }
        }
        self.store.save(&settings).await?;
        Ok(SaveResponse { ok: true })
    }

    async fn contacts_raw(&self) -> ServiceResult<ContactsResponse> {
        let pool = self.source.pool(false).await?;
        Ok(ContactsResponse::from_pool(pool.as_ref().clone()))
    }

    async fn people(&self, bust: bool) -> ServiceResult<PeopleResponse> {
        let settings = self.store.load().await?;

        let pool = match self.source.pool(bust).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Cannot derive people without a chat snapshot");
                return Ok(PeopleResponse::error(e.to_string()));
            }
        };

        let index = pool.index();
        let mut people: Vec<DerivedPerson> = settings
            .people
            .iter()
            .map(|person| derive_person(person, &index))
            .collect();
        backend_order(&mut people);

        debug!(people = people.len(), bust, "Derived people");
        Ok(PeopleResponse::people(people))
    }

    async fn status(&self) -> StatusResponse {
        match self.source.pool(false).await {
            Ok(_) => StatusResponse::connected(),
            Err(e) => StatusResponse::disconnected(e.to_string()),
        }
    }

    async fn resolve_avatar(&self, path: &str) -> ServiceResult<AvatarResponse> {
        resolve_avatar(path, &self.platform_base_url).await
    }
}
