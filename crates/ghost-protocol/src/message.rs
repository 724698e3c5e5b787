//! Contacts service response documents.

use crate::error::{ProtocolError, ProtocolResult};
use ghost_core::{ChatPool, ChatRecord, DerivedPerson};
use serde::{Deserialize, Serialize};

/// `GET contacts/raw` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactsResponse {
    /// Direct-message threads
    #[serde(default)]
    pub contacts: Vec<ChatRecord>,

    /// Group threads
    #[serde(default)]
    pub groups: Vec<ChatRecord>,

    #[serde(default)]
    pub total: usize,
}

impl ContactsResponse {
    /// Builds the response from a pool.
    ///
    /// Direct messages are listed most recent first, unknown recency last,
    /// ties by lowercase name. Groups keep pool order.
    pub fn from_pool(pool: ChatPool) -> Self {
        let ChatPool {
            mut contacts,
            groups,
        } = pool;
        contacts.sort_by(|a, b| {
            (a.days_since.is_none(), a.days_since.unwrap_or(0))
                .cmp(&(b.days_since.is_none(), b.days_since.unwrap_or(0)))
                .then_with(|| {
                    a.name_or_empty()
                        .to_lowercase()
                        .cmp(&b.name_or_empty().to_lowercase())
                })
        });
        let total = contacts.len() + groups.len();
        Self {
            contacts,
            groups,
            total,
        }
    }

    pub fn into_pool(self) -> ChatPool {
        ChatPool::new(self.contacts, self.groups)
    }
}

/// `GET people` response: derived people or an application error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeopleResponse {
    People { people: Vec<DerivedPerson> },
    Error { error: String },
}

impl PeopleResponse {
    pub fn people(people: Vec<DerivedPerson>) -> Self {
        Self::People { people }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Unwraps the people list.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Backend` carrying the service's message verbatim.
    pub fn into_result(self) -> ProtocolResult<Vec<DerivedPerson>> {
        match self {
            Self::People { people } => Ok(people),
            Self::Error { error } => Err(ProtocolError::Backend(error)),
        }
    }
}

/// `GET status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub connected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn connected() -> Self {
        Self {
            connected: true,
            error: None,
        }
    }

    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(reason.into()),
        }
    }
}

/// `POST settings` acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub ok: bool,
}
