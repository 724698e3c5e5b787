//! Integration tests for the overdue watcher.
//!
//! The watcher runs against an in-memory `ContactsService` whose answers
//! are scripted per test, and a notifier that records what it was sent.
//!
//! Tests CAN use `.unwrap()` and `.expect()`.

use async_trait::async_trait;
use ghost_core::{DerivedPerson, Person, PersonId, Settings};
use ghost_protocol::{ContactsResponse, PeopleResponse, SaveResponse, StatusResponse};
use ghostd::{
    spawn_watcher, AvatarResponse, ContactsService, Notification, Notifier, RefreshOutcome,
    RefreshRequest, ServiceError, ServiceResult, Watcher,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

/// Scripted reply for one `people` call.
enum Reply {
    People(Vec<(&'static str, Option<u32>)>),
    Error(&'static str),
    Down,
}

#[derive(Default)]
struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    busted: AtomicUsize,
}

impl ScriptedService {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }
}

fn person(id: &str, days: Option<u32>) -> DerivedPerson {
    let mut p = DerivedPerson::without_activity(&Person::with_id(id, format!("Name {id}")));
    p.days_since = days;
    p
}

#[async_trait]
impl ContactsService for ScriptedService {
    async fn settings(&self) -> ServiceResult<Settings> {
        Ok(Settings::default())
    }

    async fn save_settings(&self, _settings: Settings) -> ServiceResult<SaveResponse> {
        Ok(SaveResponse { ok: true })
    }

    async fn contacts_raw(&self) -> ServiceResult<ContactsResponse> {
        Ok(ContactsResponse::default())
    }

    async fn people(&self, bust: bool) -> ServiceResult<PeopleResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bust {
            self.busted.fetch_add(1, Ordering::SeqCst);
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::People(vec![]));
        match reply {
            Reply::People(people) => Ok(PeopleResponse::people(
                people.into_iter().map(|(id, d)| person(id, d)).collect(),
            )),
            Reply::Error(msg) => Ok(PeopleResponse::error(msg)),
            Reply::Down => Err(ServiceError::Unavailable("connection refused".to_string())),
        }
    }

    async fn status(&self) -> StatusResponse {
        StatusResponse::connected()
    }

    async fn resolve_avatar(&self, path: &str) -> ServiceResult<AvatarResponse> {
        Err(ServiceError::AvatarNotFound(path.to_string()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    denied: AtomicBool,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn permission_granted(&self) -> bool {
        !self.denied.load(Ordering::SeqCst)
    }

    async fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

fn watcher(service: Arc<ScriptedService>, notifier: Arc<RecordingNotifier>) -> Watcher {
    Watcher::new(service, notifier, 14, Duration::from_secs(120))
}

// ============================================================================
// Refresh Tests
// ============================================================================

#[tokio::test]
async fn test_rising_edge_notifies_once() {
    let service = ScriptedService::new(vec![
        Reply::People(vec![("a", Some(20)), ("b", Some(3))]),
        Reply::People(vec![("a", Some(21)), ("b", Some(3))]),
        Reply::People(vec![("a", Some(22)), ("b", Some(14))]),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut watcher = watcher(service, Arc::clone(&notifier));

    let first = watcher.refresh(false).await;
    assert_eq!(
        first,
        RefreshOutcome::Updated {
            people: 2,
            notified: vec![PersonId::new("a")]
        }
    );

    watcher.refresh(false).await;
    watcher.refresh(false).await;

    assert_eq!(
        notifier.titles(),
        vec!["Name a is now being ghosted", "Name b is now being ghosted"]
    );
}

#[tokio::test]
async fn test_recovery_then_relapse_notifies_again() {
    let service = ScriptedService::new(vec![
        Reply::People(vec![("a", Some(20))]),
        Reply::People(vec![("a", Some(5))]),
        Reply::People(vec![("a", Some(20))]),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut watcher = watcher(service, Arc::clone(&notifier));

    for _ in 0..3 {
        watcher.refresh(false).await;
    }
    assert_eq!(notifier.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_people_are_ranked() {
    let service = ScriptedService::new(vec![Reply::People(vec![
        ("fresh", Some(1)),
        ("never", None),
        ("stale", Some(40)),
    ])]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut watcher = watcher(service, notifier);

    watcher.refresh(false).await;
    let ids: Vec<&str> = watcher.people().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["stale", "fresh", "never"]);
}

#[tokio::test]
async fn test_denied_permission_still_advances_snapshot() {
    let service = ScriptedService::new(vec![
        Reply::People(vec![("a", Some(20))]),
        Reply::People(vec![("a", Some(21))]),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    notifier.denied.store(true, Ordering::SeqCst);
    let mut watcher = watcher(service, Arc::clone(&notifier));

    let outcome = watcher.refresh(false).await;
    assert_eq!(
        outcome,
        RefreshOutcome::Updated {
            people: 1,
            notified: vec![]
        }
    );
    assert!(watcher.detector().was_overdue(&PersonId::new("a")));

    // Granting permission later does not replay the old transition
    notifier.denied.store(false, Ordering::SeqCst);
    watcher.refresh(false).await;
    assert!(notifier.titles().is_empty());
}

#[tokio::test]
async fn test_backend_error_and_disconnect() {
    let service = ScriptedService::new(vec![Reply::Error("Token expired"), Reply::Down]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut watcher = watcher(service, notifier);

    assert_eq!(
        watcher.refresh(false).await,
        RefreshOutcome::BackendError("Token expired".to_string())
    );
    assert_eq!(watcher.refresh(false).await, RefreshOutcome::Disconnected);
    assert_eq!(watcher.detector().tracked(), 0);
}

#[tokio::test]
async fn test_failed_refresh_keeps_snapshot() {
    let service = ScriptedService::new(vec![
        Reply::People(vec![("a", Some(20))]),
        Reply::Down,
        Reply::People(vec![("a", Some(22))]),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let mut watcher = watcher(service, Arc::clone(&notifier));

    for _ in 0..3 {
        watcher.refresh(false).await;
    }
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

// ============================================================================
// Run Loop Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_ticks_until_cancelled() {
    let service = ScriptedService::new(vec![]);
    let notifier = Arc::new(RecordingNotifier::default());
    let watcher = watcher(Arc::clone(&service), notifier);

    let cancel = CancellationToken::new();
    let (_tx, handle) = spawn_watcher(watcher, cancel.clone());

    // First tick fires immediately, then every 120s
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(240)).await;
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_busts_cache() {
    let service = ScriptedService::new(vec![]);
    let notifier = Arc::new(RecordingNotifier::default());
    let watcher = watcher(Arc::clone(&service), notifier);

    let cancel = CancellationToken::new();
    let (tx, handle) = spawn_watcher(watcher, cancel.clone());
    tokio::time::sleep(Duration::from_secs(1)).await;

    tx.send(RefreshRequest).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.busted.load(Ordering::SeqCst), 1);

    // Dropping the sender leaves the tick running
    drop(tx);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);

    cancel.cancel();
    handle.await.unwrap();
}
