//! Domain-specific error types following panic-free policy.

use crate::{ChatId, PersonId};
use thiserror::Error;

/// Errors that can occur in domain operations.
///
/// The engines themselves never fail on malformed input; these errors
/// only come out of roster editing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A person cannot be saved without a display name
    #[error("Person {person_id} needs a display name before it can be saved")]
    EmptyDisplayName { person_id: PersonId },

    /// Person not found in the roster
    #[error("Person not found: {person_id}")]
    PersonNotFound { person_id: PersonId },

    /// Chat is not among the linkable candidates for this person
    #[error("Chat {chat_id} cannot be linked to {person_id}")]
    ChatNotOffered {
        person_id: PersonId,
        chat_id: ChatId,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::ChatNotOffered {
            person_id: PersonId::new("p1"),
            chat_id: ChatId::new("c1"),
        };
        assert_eq!(err.to_string(), "Chat c1 cannot be linked to p1");

        let err = DomainError::EmptyDisplayName {
            person_id: PersonId::new("p2"),
        };
        assert!(err.to_string().contains("display name"));
    }
}
