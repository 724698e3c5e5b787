//! Persisted settings document and roster editing.
//!
//! The document is saved whole: every edit produces a new `Settings`
//! that replaces the stored one.

use crate::candidates::link_offered;
use crate::chat::{ChatId, ChatPool};
use crate::error::{DomainError, DomainResult};
use crate::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Persisted configuration. Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub setup_complete: bool,

    #[serde(default)]
    pub people: Vec<Person>,

    /// Groups whose member lists are shown expanded on the dashboard
    #[serde(default)]
    pub expanded_groups: Vec<ChatId>,
}

impl Settings {
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|p| &p.id == id)
    }

    fn require(&self, id: &PersonId) -> DomainResult<&Person> {
        self.person(id).ok_or_else(|| DomainError::PersonNotFound {
            person_id: id.clone(),
        })
    }

    /// Saves an edited or new person.
    ///
    /// Replaces the entry with the same id or appends a copy, and marks
    /// setup as complete. The draft is only borrowed.
    ///
    /// # Errors
    ///
    /// `DomainError::EmptyDisplayName` for a blank name. Nothing is
    /// modified and the draft is left as it was.
    pub fn save_person(&mut self, person: &Person) -> DomainResult<()> {
        if !person.has_display_name() {
            return Err(DomainError::EmptyDisplayName {
                person_id: person.id.clone(),
            });
        }

        match self.people.iter_mut().find(|p| p.id == person.id) {
            Some(existing) => *existing = person.clone(),
            None => {
                info!(person_id = %person.id, "Adding tracked person");
                self.people.push(person.clone());
            }
        }
        self.setup_complete = true;
        Ok(())
    }

    /// Removes a person; returns false if no such id.
    pub fn remove_person(&mut self, id: &PersonId) -> bool {
        let before = self.people.len();
        self.people.retain(|p| &p.id != id);
        let removed = self.people.len() != before;
        if removed {
            info!(person_id = %id, "Removed tracked person");
        }
        removed
    }

    /// Completes first-run setup with the drafted people.
    ///
    /// Drafts with blank names are dropped rather than rejected.
    pub fn finish_setup(&mut self, drafts: Vec<Person>) {
        let total = drafts.len();
        self.people = drafts.into_iter().filter(Person::has_display_name).collect();
        self.setup_complete = true;
        debug!(kept = self.people.len(), dropped = total - self.people.len(), "Setup finished");
    }

    /// Links a chat to a person if the candidate resolver offers it.
    ///
    /// Returns `Ok(false)` when it was already linked.
    pub fn link_chat(
        &mut self,
        pool: &ChatPool,
        id: &PersonId,
        chat_id: &ChatId,
    ) -> DomainResult<bool> {
        let mut target = self.require(id)?.clone();
        let changed = link_offered(pool, &self.people, &mut target, chat_id)?;
        if changed {
            self.replace(target);
        }
        Ok(changed)
    }

    /// Unlinks a chat; returns false if it was not linked.
    pub fn unlink_chat(&mut self, id: &PersonId, chat_id: &ChatId) -> DomainResult<bool> {
        let mut target = self.require(id)?.clone();
        let changed = target.unlink(chat_id);
        if changed {
            self.replace(target);
        }
        Ok(changed)
    }

    /// Renames a person.
    ///
    /// # Errors
    ///
    /// `DomainError::EmptyDisplayName` for a blank name,
    /// `DomainError::PersonNotFound` for an unknown id.
    pub fn rename_person(&mut self, id: &PersonId, display_name: &str) -> DomainResult<()> {
        let mut target = self.require(id)?.clone();
        target.display_name = display_name.to_string();
        self.save_person(&target)
    }

    fn replace(&mut self, person: Person) {
        if let Some(existing) = self.people.iter_mut().find(|p| p.id == person.id) {
            *existing = person;
        }
    }
}
