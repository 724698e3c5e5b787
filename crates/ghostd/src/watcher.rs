//! Periodic refresh loop that raises ghosting notifications.
//!
//! A single task owns the [`OverdueDetector`], so rising-edge detection
//! never runs concurrently with itself. Ticks come from a
//! `tokio::time::interval`; manual refreshes arrive over an mpsc channel
//! and skip the chat cache.
//!
//! # Panic-Free Guarantees
//!
//! No `.unwrap()` or `.expect()`. Failed refreshes are logged and the
//! loop waits for the next tick.

use crate::notify::{Notification, Notifier};
use crate::service::ContactsService;
use ghost_core::{rank_people, DerivedPerson, OverdueDetector, PersonId};
use ghost_protocol::PeopleResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Manual refresh queue depth.
const REQUEST_BUFFER: usize = 8;

/// Result of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// People were ranked; `notified` lists the rising edges.
    Updated {
        people: usize,
        notified: Vec<PersonId>,
    },

    /// The backend answered with an application error.
    BackendError(String),

    /// The backend could not be reached.
    Disconnected,
}

/// Request for an out-of-schedule refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest;

/// Sender side used by the CLI to trigger a refresh.
pub type RefreshSender = mpsc::Sender<RefreshRequest>;

/// Creates the manual refresh channel.
pub fn refresh_channel() -> (RefreshSender, mpsc::Receiver<RefreshRequest>) {
    mpsc::channel(REQUEST_BUFFER)
}

pub struct Watcher {
    service: Arc<dyn ContactsService>,
    notifier: Arc<dyn Notifier>,
    detector: OverdueDetector,
    people: Vec<DerivedPerson>,
    period: Duration,
}

impl Watcher {
    pub fn new(
        service: Arc<dyn ContactsService>,
        notifier: Arc<dyn Notifier>,
        threshold_days: u32,
        period: Duration,
    ) -> Self {
        Self {
            service,
            notifier,
            detector: OverdueDetector::with_threshold(threshold_days),
            people: Vec::new(),
            period,
        }
    }

    /// Dashboard order from the last successful refresh.
    pub fn people(&self) -> &[DerivedPerson] {
        &self.people
    }

    pub fn detector(&self) -> &OverdueDetector {
        &self.detector
    }

    /// Fetches people, ranks them and notifies on new overdue transitions.
    ///
    /// The detector snapshot advances even when notifications are not
    /// permitted, so granting permission later does not replay old edges.
    pub async fn refresh(&mut self, bust: bool) -> RefreshOutcome {
        let response = match self.service.people(bust).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Contacts service unreachable");
                return RefreshOutcome::Disconnected;
            }
        };

        let people = match response {
            PeopleResponse::People { people } => people,
            PeopleResponse::Error { error } => {
                warn!(error = %error, "Contacts service reported an error");
                return RefreshOutcome::BackendError(error);
            }
        };

        self.people = rank_people(&people, DerivedPerson::clone, None);
        let rising = self.detector.detect_rising_edges(&self.people);

        let mut notified = Vec::new();
        if self.notifier.permission_granted() {
            for id in &rising {
                if let Some(person) = self.people.iter().find(|p| &p.id == id) {
                    self.notifier.notify(Notification::ghosting(person)).await;
                    notified.push(id.clone());
                }
            }
        } else if !rising.is_empty() {
            debug!(rising = rising.len(), "Notifications not permitted");
        }

        RefreshOutcome::Updated {
            people: self.people.len(),
            notified,
        }
    }

    /// Refreshes on every tick and manual request until cancelled.
    ///
    /// The first tick fires immediately.
    pub async fn run(
        mut self,
        cancel_token: CancellationToken,
        mut requests: mpsc::Receiver<RefreshRequest>,
    ) {
        let mut tick = interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut requests_open = true;

        info!(interval_secs = self.period.as_secs(), "Watcher started");

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    info!("Watcher shutting down");
                    break;
                }

                request = requests.recv(), if requests_open => {
                    match request {
                        Some(RefreshRequest) => {
                            let outcome = self.refresh(true).await;
                            debug!(?outcome, "Manual refresh complete");
                        }
                        None => requests_open = false,
                    }
                }

                _ = tick.tick() => {
                    let outcome = self.refresh(false).await;
                    debug!(?outcome, "Scheduled refresh complete");
                }
            }
        }

        debug!("Watcher task completed");
    }
}

/// Spawns [`Watcher::run`] on the runtime.
pub fn spawn_watcher(
    watcher: Watcher,
    cancel_token: CancellationToken,
) -> (RefreshSender, tokio::task::JoinHandle<()>) {
    let (tx, rx) = refresh_channel();
    let handle = tokio::spawn(watcher.run(cancel_token, rx));
    (tx, handle)
}
