//! Row models
//!
//! Timestamps are stored as unix nanoseconds so that messages written in
//! the same second still order and window correctly. List-valued columns
//! are JSON text.

use reno_core::{
    Author, Contractor, Match, MatchStatus, Message, RenovationRequest, Role, User, Visit,
    VisitStatus,
};
use time::OffsetDateTime;

use crate::{Result, StorageError};

pub fn encode_time(at: OffsetDateTime) -> Result<i64> {
    i64::try_from(at.unix_timestamp_nanos())
        .map_err(|_| StorageError::Other(anyhow::anyhow!("timestamp {} out of range", at)))
}

pub fn decode_time(nanos: i64) -> Result<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))?)
}

fn decode_opt_time(nanos: Option<i64>) -> Result<Option<OffsetDateTime>> {
    nanos.map(decode_time).transpose()
}

/// Slots are whole seconds, matching how they travel over the API.
pub fn encode_slots(slots: &[OffsetDateTime]) -> Result<String> {
    let seconds: Vec<i64> = slots.iter().map(|s| s.unix_timestamp()).collect();
    Ok(serde_json::to_string(&seconds)?)
}

fn decode_slots(raw: &str) -> Result<Vec<OffsetDateTime>> {
    serde_json::from_str::<Vec<i64>>(raw)?
        .into_iter()
        .map(|s| OffsetDateTime::from_unix_timestamp(s).map_err(StorageError::from))
        .collect()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse::<Role>()?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractorRow {
    pub id: String,
    pub user_id: Option<String>,
    pub company_name: String,
    pub city: String,
    pub rating: f64,
    pub review_count: i64,
    pub specialties: String,
    pub verified: bool,
}

impl TryFrom<ContractorRow> for Contractor {
    type Error = StorageError;

    fn try_from(row: ContractorRow) -> Result<Self> {
        Ok(Contractor {
            id: row.id,
            user_id: row.user_id,
            company_name: row.company_name,
            city: row.city,
            rating: row.rating,
            review_count: row.review_count,
            specialties: serde_json::from_str(&row.specialties)?,
            verified: row.verified,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRow {
    pub id: String,
    pub consumer_id: String,
    pub template_ids: String,
    pub scope: String,
    pub created_at: i64,
}

impl TryFrom<RequestRow> for RenovationRequest {
    type Error = StorageError;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(RenovationRequest {
            id: row.id,
            consumer_id: row.consumer_id,
            template_ids: serde_json::from_str(&row.template_ids)?,
            scope: serde_json::from_str(&row.scope)?,
            created_at: decode_time(row.created_at)?,
        })
    }
}

/// A match joined with the owning account of its contractor.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: String,
    pub consumer_id: String,
    pub contractor_id: String,
    pub contractor_user_id: Option<String>,
    pub request_id: String,
    pub template_id: Option<String>,
    pub status: String,
    pub name_revealed: bool,
    pub revealed_at: Option<i64>,
    pub created_at: i64,
}

impl TryFrom<MatchRow> for Match {
    type Error = StorageError;

    fn try_from(row: MatchRow) -> Result<Self> {
        Ok(Match {
            id: row.id,
            consumer_id: row.consumer_id,
            contractor_id: row.contractor_id,
            contractor_user_id: row.contractor_user_id,
            request_id: row.request_id,
            template_id: row.template_id,
            status: row.status.parse::<MatchStatus>()?,
            name_revealed: row.name_revealed,
            revealed_at: decode_opt_time(row.revealed_at)?,
            created_at: decode_time(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub match_id: String,
    pub content: String,
    pub is_filtered: bool,
    pub consumer_id: Option<String>,
    pub contractor_id: Option<String>,
    pub created_at: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = StorageError;

    fn try_from(row: MessageRow) -> Result<Self> {
        let author = match (row.consumer_id, row.contractor_id) {
            (Some(id), None) => Author::Consumer(id),
            (None, Some(id)) => Author::Contractor(id),
            _ => {
                return Err(StorageError::Other(anyhow::anyhow!(
                    "message {} must have exactly one author",
                    row.id
                )));
            }
        };

        Ok(Message {
            id: row.id,
            match_id: row.match_id,
            content: row.content,
            is_filtered: row.is_filtered,
            author,
            created_at: decode_time(row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisitRow {
    pub id: String,
    pub match_id: String,
    pub proposed_slots: String,
    pub scheduled_at: Option<i64>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<VisitRow> for Visit {
    type Error = StorageError;

    fn try_from(row: VisitRow) -> Result<Self> {
        Ok(Visit {
            id: row.id,
            match_id: row.match_id,
            proposed_slots: decode_slots(&row.proposed_slots)?,
            scheduled_at: decode_opt_time(row.scheduled_at)?,
            status: row.status.parse::<VisitStatus>()?,
            created_at: decode_time(row.created_at)?,
            updated_at: decode_time(row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_time_keeps_sub_second_precision() {
        let at = datetime!(2030-01-01 12:00:00.123456789 UTC);
        assert_eq!(decode_time(encode_time(at).unwrap()).unwrap(), at);
    }

    #[test]
    fn test_slots_are_whole_seconds() {
        let slots = vec![datetime!(2030-05-01 09:00 UTC), datetime!(2030-05-02 14:30 UTC)];
        let raw = encode_slots(&slots).unwrap();
        assert_eq!(raw, "[1903856400,1903962600]");
        assert_eq!(decode_slots(&raw).unwrap(), slots);
    }

    #[test]
    fn test_message_row_needs_one_author() {
        let row = MessageRow {
            id: "m".to_string(),
            match_id: "x".to_string(),
            content: "hoi".to_string(),
            is_filtered: false,
            consumer_id: Some("u".to_string()),
            contractor_id: Some("c".to_string()),
            created_at: 0,
        };
        assert!(Message::try_from(row).is_err());
    }
}
