//! Match domain model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::CoreError;

/// Lifecycle state of a consumer-contractor pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Matched,
    Chatting,
    VisitProposed,
    VisitConfirmed,
    Completed,
    Declined,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::Chatting => "CHATTING",
            Self::VisitProposed => "VISIT_PROPOSED",
            Self::VisitConfirmed => "VISIT_CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Declined => "DECLINED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Declined | Self::Cancelled)
    }

    /// Past plain `MATCHED`: entering one of these cancels idle rivals.
    pub fn is_escalated(&self) -> bool {
        matches!(
            self,
            Self::Chatting | Self::VisitProposed | Self::VisitConfirmed
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATCHED" => Ok(Self::Matched),
            "CHATTING" => Ok(Self::Chatting),
            "VISIT_PROPOSED" => Ok(Self::VisitProposed),
            "VISIT_CONFIRMED" => Ok(Self::VisitConfirmed),
            "COMPLETED" => Ok(Self::Completed),
            "DECLINED" => Ok(Self::Declined),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(CoreError::Database(format!("unknown match status: {}", other))),
        }
    }
}

/// One consumer-contractor pairing for a renovation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub consumer_id: String,
    pub contractor_id: String,
    /// Account that owns the contractor profile, if any
    pub contractor_user_id: Option<String>,
    pub request_id: String,
    pub template_id: Option<String>,
    pub status: MatchStatus,
    pub name_revealed: bool,
    #[serde(with = "time::serde::timestamp::option")]
    pub revealed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl Match {
    pub fn new(consumer_id: String, contractor: &Contractor, request_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            consumer_id,
            contractor_id: contractor.id.clone(),
            contractor_user_id: contractor.user_id.clone(),
            request_id,
            template_id: None,
            status: MatchStatus::Matched,
            name_revealed: false,
            revealed_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_template(mut self, template_id: Option<String>) -> Self {
        self.template_id = template_id;
        self
    }

    /// One-way: the first reveal timestamp is kept.
    pub fn reveal(&mut self, now: OffsetDateTime) {
        self.name_revealed = true;
        self.revealed_at.get_or_insert(now);
    }
}

/// Verified company that can be matched to requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contractor {
    pub id: String,
    pub user_id: Option<String>,
    pub company_name: String,
    pub city: String,
    pub rating: f64,
    pub review_count: i64,
    pub specialties: Vec<String>,
    pub verified: bool,
}

impl Contractor {
    pub fn new(company_name: String, city: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            company_name,
            city,
            rating: 0.0,
            review_count: 0,
            specialties: Vec::new(),
            verified: false,
        }
    }

    pub fn profile(&self) -> ContractorProfile {
        ContractorProfile {
            rating: self.rating,
            review_count: self.review_count,
            city: self.city.clone(),
            specialties: self.specialties.clone(),
        }
    }
}

/// The part of a contractor that is visible before the reveal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractorProfile {
    pub rating: f64,
    pub review_count: i64,
    pub city: String,
    pub specialties: Vec<String>,
}

/// Consumer request naming the project templates to quote for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenovationRequest {
    pub id: String,
    pub consumer_id: String,
    pub template_ids: Vec<String>,
    pub scope: Vec<String>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl RenovationRequest {
    pub fn new(consumer_id: String, template_ids: Vec<String>, scope: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            consumer_id,
            template_ids,
            scope,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn primary_template(&self) -> Option<&str> {
        self.template_ids.first().map(String::as_str)
    }
}
