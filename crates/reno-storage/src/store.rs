use async_trait::async_trait;
use reno_core::{
    Contractor, MarketStore, Match, Message, RenovationRequest, Result, Transition, User, Visit,
};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

use crate::{Storage, StorageError};

#[async_trait]
impl MarketStore for Storage {
    async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(StorageError::from)?;
        Ok(started.elapsed())
    }

    async fn upsert_user(&self, user: &User) -> Result<User> {
        Ok(self.save_user(user).await?)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.get_user(id).await?)
    }

    async fn upsert_contractor(&self, contractor: &Contractor) -> Result<Contractor> {
        Ok(self.save_contractor(contractor).await?)
    }

    async fn find_contractor(&self, id: &str) -> Result<Option<Contractor>> {
        Ok(self.get_contractor(id).await?)
    }

    async fn create_request(&self, request: &RenovationRequest) -> Result<()> {
        Ok(self.insert_request(request).await?)
    }

    async fn find_request(&self, id: &str) -> Result<Option<RenovationRequest>> {
        Ok(self.get_request(id).await?)
    }

    async fn create_matches(&self, matches: &[Match]) -> Result<()> {
        Ok(self.insert_matches(matches).await?)
    }

    async fn find_match(&self, id: &str) -> Result<Option<Match>> {
        Ok(self.get_match(id).await?)
    }

    async fn list_matches_for_request(&self, request_id: &str) -> Result<Vec<Match>> {
        Ok(self.matches_for_request(request_id).await?)
    }

    async fn list_matches_for_consumer(&self, user_id: &str) -> Result<Vec<Match>> {
        Ok(self.matches_for_consumer(user_id).await?)
    }

    async fn list_matches_for_contractor_user(&self, user_id: &str) -> Result<Vec<Match>> {
        Ok(self.matches_for_contractor_user(user_id).await?)
    }

    async fn apply_transition(
        &self,
        match_id: &str,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Match> {
        Ok(self.transition_match(match_id, transition, now).await?)
    }

    async fn create_message(&self, message: &Message, transition: &Transition) -> Result<()> {
        Ok(self.insert_message(message, transition).await?)
    }

    async fn list_messages(&self, match_id: &str) -> Result<Vec<Message>> {
        Ok(self.messages_for(match_id).await?)
    }

    async fn list_recent_messages(
        &self,
        match_id: &str,
        since: OffsetDateTime,
    ) -> Result<Vec<Message>> {
        Ok(self.messages_since(match_id, since).await?)
    }

    async fn find_visit(&self, id: &str) -> Result<Option<Visit>> {
        Ok(self.get_visit(id).await?)
    }

    async fn find_visit_for_match(&self, match_id: &str) -> Result<Option<Visit>> {
        Ok(self.visit_for_match(match_id).await?)
    }

    async fn propose_visit(
        &self,
        match_id: &str,
        slots: &[OffsetDateTime],
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Visit> {
        Ok(self
            .save_visit_proposal(match_id, slots, transition, now)
            .await?)
    }

    async fn confirm_visit(
        &self,
        visit_id: &str,
        slot: OffsetDateTime,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<(Visit, Match)> {
        Ok(self
            .confirm_visit_slot(visit_id, slot, transition, now)
            .await?)
    }
}
