//! Response shapes with identity fields filled in per the disclosure policy

use reno_core::{ContractorProfile, Match, MatchStatus, Message, Visit};
use serde::Serialize;
use time::OffsetDateTime;

/// Contractor as seen through a match. `company_name` stays empty until the
/// match is revealed; the label stands in for it.
#[derive(Debug, Clone, Serialize)]
pub struct ContractorView {
    pub label: String,
    #[serde(flatten)]
    pub profile: ContractorProfile,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub id: String,
    pub request_id: String,
    pub template_id: Option<String>,
    pub status: MatchStatus,
    pub name_revealed: bool,
    #[serde(with = "time::serde::timestamp::option")]
    pub revealed_at: Option<OffsetDateTime>,
    pub contractor: ContractorView,
    /// Only for contractor callers, and only once revealed.
    pub consumer_name: Option<String>,
    pub visit: Option<Visit>,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl MatchView {
    pub(crate) fn new(m: &Match, contractor: ContractorView) -> Self {
        Self {
            id: m.id.clone(),
            request_id: m.request_id.clone(),
            template_id: m.template_id.clone(),
            status: m.status,
            name_revealed: m.name_revealed,
            revealed_at: m.revealed_at,
            contractor,
            consumer_name: None,
            visit: None,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageThread {
    pub match_id: String,
    pub label: String,
    pub name_revealed: bool,
    pub messages: Vec<Message>,
}
