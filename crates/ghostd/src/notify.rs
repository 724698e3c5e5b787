//! Notification sink for overdue transitions.

use async_trait::async_trait;
use ghost_core::{DerivedPerson, PersonId};
use tracing::info;

/// One "you are ghosting someone" alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub person_id: PersonId,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn ghosting(person: &DerivedPerson) -> Self {
        Self {
            person_id: person.id.clone(),
            title: format!("{} is now being ghosted", person.display_name),
            body: format!("Time to lock in and message {}", person.display_name),
        }
    }
}

/// Where notifications go.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Whether the user allowed notifications. Nothing is sent otherwise.
    fn permission_granted(&self) -> bool;

    async fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn permission_granted(&self) -> bool {
        true
    }

    async fn notify(&self, notification: Notification) {
        info!(
            person_id = %notification.person_id,
            body = %notification.body,
            "{}",
            notification.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_core::Person;

    #[test]
    fn test_ghosting_text() {
        let person = DerivedPerson::without_activity(&Person::with_id("p1", "Maya"));
        let n = Notification::ghosting(&person);
        assert_eq!(n.title, "Maya is now being ghosted");
        assert_eq!(n.body, "Time to lock in and message Maya");
        assert_eq!(n.person_id, PersonId::new("p1"));
    }
}
