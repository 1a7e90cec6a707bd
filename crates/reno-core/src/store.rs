//! Storage boundary for the marketplace core
//!
//! Implementations must apply every method that takes a [`Transition`] as a
//! single atomic unit: the triggering write, the guarded match update
//! (`WHERE status = transition.from`), the reveal, the visit side effect and
//! the rival cancellation either all happen or none do. A guard miss is
//! reported as [`CoreError::StateConflict`](crate::CoreError::StateConflict).

use async_trait::async_trait;
use std::time::Duration;
use time::OffsetDateTime;

use crate::{
    Contractor, Match, Message, RenovationRequest, Result, Transition, User, Visit,
};

#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<Duration>;

    /// Insert or update by email; returns the stored record.
    async fn upsert_user(&self, user: &User) -> Result<User>;
    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    /// Insert or update by company name; returns the stored record.
    async fn upsert_contractor(&self, contractor: &Contractor) -> Result<Contractor>;
    async fn find_contractor(&self, id: &str) -> Result<Option<Contractor>>;

    async fn create_request(&self, request: &RenovationRequest) -> Result<()>;
    async fn find_request(&self, id: &str) -> Result<Option<RenovationRequest>>;

    /// Insert a whole match set in one transaction.
    async fn create_matches(&self, matches: &[Match]) -> Result<()>;
    async fn find_match(&self, id: &str) -> Result<Option<Match>>;
    /// Ordered by creation time; this ordering defines contractor labels.
    async fn list_matches_for_request(&self, request_id: &str) -> Result<Vec<Match>>;
    async fn list_matches_for_consumer(&self, user_id: &str) -> Result<Vec<Match>>;
    async fn list_matches_for_contractor_user(&self, user_id: &str) -> Result<Vec<Match>>;

    async fn apply_transition(
        &self,
        match_id: &str,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Match>;

    /// Persist a message together with the status change it causes.
    async fn create_message(&self, message: &Message, transition: &Transition) -> Result<()>;
    /// Oldest first.
    async fn list_messages(&self, match_id: &str) -> Result<Vec<Message>>;
    /// Messages created strictly after `since`, oldest first.
    async fn list_recent_messages(
        &self,
        match_id: &str,
        since: OffsetDateTime,
    ) -> Result<Vec<Message>>;

    async fn find_visit(&self, id: &str) -> Result<Option<Visit>>;
    async fn find_visit_for_match(&self, match_id: &str) -> Result<Option<Visit>>;
    /// Create the match's visit or replace its slot list, resetting it to
    /// `PROPOSED`.
    async fn propose_visit(
        &self,
        match_id: &str,
        slots: &[OffsetDateTime],
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Visit>;
    /// Schedule `slot` on a `PROPOSED` visit and reveal the match.
    async fn confirm_visit(
        &self,
        visit_id: &str,
        slot: OffsetDateTime,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<(Visit, Match)>;
}
