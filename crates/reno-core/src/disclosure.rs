//! Disclosure policy: what each side may see of the other
//!
//! Write-time sanitization is the primary enforcement point. The read-time
//! check only catches messages that were stored unsanitized while the match
//! was still anonymous.

use crate::{Match, Message};

pub fn should_sanitize_outbound(m: &Match) -> bool {
    !m.name_revealed
}

pub fn should_sanitize_on_read(m: &Match, message: &Message) -> bool {
    !m.name_revealed && !message.is_filtered
}

/// Pass identity data through only once the match is revealed.
pub fn disclose<T>(m: &Match, identity: impl FnOnce() -> T) -> Option<T> {
    m.name_revealed.then(identity)
}
