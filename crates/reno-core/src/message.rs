//! Chat message domain model

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who wrote a message: exactly one side of the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Author {
    /// Consumer user id
    Consumer(String),
    /// Contractor profile id
    Contractor(String),
}

impl Author {
    pub fn consumer_id(&self) -> Option<&str> {
        match self {
            Self::Consumer(id) => Some(id),
            Self::Contractor(_) => None,
        }
    }

    pub fn contractor_id(&self) -> Option<&str> {
        match self {
            Self::Contractor(id) => Some(id),
            Self::Consumer(_) => None,
        }
    }
}

/// One stored chat utterance. `content` is what was persisted, which is
/// the sanitized text when the match was still anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub match_id: String,
    pub content: String,
    pub is_filtered: bool,
    pub author: Author,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn new(match_id: String, author: Author, content: String, is_filtered: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            match_id,
            content,
            is_filtered,
            author,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = created_at;
        self
    }
}
