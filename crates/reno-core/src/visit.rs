//! Visit domain model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Proposed,
    Confirmed,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "PROPOSED",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROPOSED" => Ok(Self::Proposed),
            "CONFIRMED" => Ok(Self::Confirmed),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(CoreError::Database(format!("unknown visit status: {}", other))),
        }
    }
}

/// In-person appointment negotiated inside a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub match_id: String,
    #[serde(with = "slots")]
    pub proposed_slots: Vec<OffsetDateTime>,
    #[serde(with = "time::serde::timestamp::option")]
    pub scheduled_at: Option<OffsetDateTime>,
    pub status: VisitStatus,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

impl Visit {
    pub fn new(match_id: String, proposed_slots: Vec<OffsetDateTime>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            match_id,
            proposed_slots,
            scheduled_at: None,
            status: VisitStatus::Proposed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Exact timestamp equality against the stored slot list.
    pub fn offers(&self, slot: OffsetDateTime) -> bool {
        self.proposed_slots.contains(&slot)
    }
}

/// Drops the sub-second part; slots are stored and compared at this precision.
pub fn truncate_to_second(at: OffsetDateTime) -> OffsetDateTime {
    at - time::Duration::nanoseconds(i64::from(at.nanosecond()))
}

/// Slots travel as unix-second integers, like every other timestamp.
pub mod slots {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(slots: &[OffsetDateTime], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        slots
            .iter()
            .map(|slot| slot.unix_timestamp())
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<i64>::deserialize(deserializer)?
            .into_iter()
            .map(|ts| OffsetDateTime::from_unix_timestamp(ts).map_err(serde::de::Error::custom))
            .collect()
    }
}
