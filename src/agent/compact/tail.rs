//! Tail normalization
//!
//! Slicing the most recent N messages out of a conversation can leave a
//! sequence that opens with an assistant reply or repeats a speaker. Chat
//! endpoints reject both, so the kept tail is repaired before it follows a
//! summary turn:
//! - leading messages that are not `user` or `tool` are dropped
//! - each later message is kept only if its role differs from the last kept one

use crate::agent::message::{Message, Role};

/// Produce a role-valid sequence from a conversation tail
///
/// The result is an order-preserving subsequence of the input. Within a run
/// of same-role messages the first one survives; the rest are discarded.
pub fn normalize_tail(tail: Vec<Message>) -> Vec<Message> {
    let mut kept: Vec<Message> = Vec::with_capacity(tail.len());
    let mut last_role: Option<Role> = None;

    for message in tail
        .into_iter()
        .skip_while(|m| !m.role.can_open_tail())
    {
        if last_role == Some(message.role) {
            continue;
        }
        last_role = Some(message.role);
        kept.push(message);
    }

    kept
}

/// Check that a sequence could have come out of [`normalize_tail`]
pub fn is_normalized(messages: &[Message]) -> bool {
    match messages.first() {
        None => true,
        Some(first) => {
            first.role.can_open_tail() && messages.windows(2).all(|w| w[0].role != w[1].role)
        }
    }
}
