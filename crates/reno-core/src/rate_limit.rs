//! Per-participant chat posting limits
//!
//! The check counts messages already stored for the match, so concurrent
//! sends from one participant can slip past the cap. This is a best-effort
//! bound.

use time::{Duration, OffsetDateTime};

use crate::{Author, CoreError, Message, Result};

pub const MESSAGES_PER_MINUTE: usize = 5;
pub const MESSAGES_PER_FIVE_MINUTES: usize = 20;

const SHORT_WINDOW: Duration = Duration::minutes(1);
const LONG_WINDOW: Duration = Duration::minutes(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRateLimiter {
    pub per_minute: usize,
    pub per_five_minutes: usize,
}

impl MessageRateLimiter {
    pub fn new(per_minute: usize, per_five_minutes: usize) -> Self {
        Self {
            per_minute,
            per_five_minutes,
        }
    }

    /// Oldest creation time that still counts; fetch messages newer than this.
    pub fn lookback(&self, now: OffsetDateTime) -> OffsetDateTime {
        now - LONG_WINDOW
    }

    /// Admit or reject one more message from `author`, given the match's
    /// recent messages (any author, any age; filtering happens here).
    pub fn check(&self, author: &Author, recent: &[Message], now: OffsetDateTime) -> Result<()> {
        let long_cutoff = now - LONG_WINDOW;
        let short_cutoff = now - SHORT_WINDOW;

        let mine: Vec<&Message> = recent
            .iter()
            .filter(|m| m.author == *author && m.created_at > long_cutoff)
            .collect();

        if mine.len() >= self.per_five_minutes {
            return Err(CoreError::RateLimited(
                "Too many messages sent. Please try again in a few minutes.".to_string(),
            ));
        }

        let last_minute = mine.iter().filter(|m| m.created_at > short_cutoff).count();
        if last_minute >= self.per_minute {
            return Err(CoreError::RateLimited(
                "Messages sent too quickly. Please wait a moment.".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for MessageRateLimiter {
    fn default() -> Self {
        Self::new(MESSAGES_PER_MINUTE, MESSAGES_PER_FIVE_MINUTES)
    }
}
