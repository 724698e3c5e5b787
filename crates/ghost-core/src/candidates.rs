//! Candidate resolver: which chats can still be linked to a person.

use crate::chat::{ChatId, ChatPool, ChatRecord};
use crate::error::{DomainError, DomainResult};
use crate::matching;
use crate::person::Person;
use crate::registry::linked_direct_message_ids;
use tracing::debug;

/// Ranked chats that can still be linked to `target`.
///
/// The pool is every direct message plus every group with more than one
/// other member. From it we drop chats `target` already holds and direct
/// messages claimed by anyone else in `roster`; groups are never dropped
/// for being claimed. What is left is ranked against `query`.
///
/// `target` need not be in `roster` yet (a person being created). An empty
/// result means "no contacts found", not an error.
pub fn candidates<'a>(
    pool: &'a ChatPool,
    roster: &[Person],
    target: &Person,
    query: &str,
) -> Vec<&'a ChatRecord> {
    let taken = linked_direct_message_ids(roster, pool, Some(&target.id));

    let direct = pool
        .contacts
        .iter()
        .filter(|c| !taken.contains(&c.id));
    let groups = pool.groups.iter().filter(|g| g.is_linkable());

    let eligible = direct
        .chain(groups)
        .filter(|c| !target.is_linked(&c.id));

    let ranked = matching::rank(eligible, query);
    debug!(
        person_id = %target.id,
        candidates = ranked.len(),
        "Resolved link candidates"
    );
    ranked
}

/// Links `chat_id` to `target` only if the resolver would offer it.
///
/// Returns `Ok(false)` when the chat was already linked to `target`.
///
/// # Errors
///
/// `DomainError::ChatNotOffered` if the chat is unknown, a single-member
/// group, or a direct message held by someone else.
pub fn link_offered(
    pool: &ChatPool,
    roster: &[Person],
    target: &mut Person,
    chat_id: &ChatId,
) -> DomainResult<bool> {
    if target.is_linked(chat_id) {
        return Ok(false);
    }
    let offered = candidates(pool, roster, target, "")
        .iter()
        .any(|c| &c.id == chat_id);
    if !offered {
        return Err(DomainError::ChatNotOffered {
            person_id: target.id.clone(),
            chat_id: chat_id.clone(),
        });
    }
    Ok(target.link(chat_id.clone()))
}
