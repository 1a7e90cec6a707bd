//! SQL queries
//!
//! Every write that carries a [`Transition`] runs in one transaction: the
//! triggering write, the guarded match update, the visit side effect and
//! the rival cancellation commit together or not at all.

use reno_core::{
    Contractor, Match, Message, RenovationRequest, Transition, User, Visit, VisitStatus,
    visit::truncate_to_second,
};
use sqlx::SqliteConnection;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::models::{
    ContractorRow, MatchRow, MessageRow, RequestRow, UserRow, VisitRow, encode_slots,
    encode_time,
};
use crate::{Result, Storage, StorageError};

const MATCH_SELECT: &str = "SELECT m.id, m.consumer_id, m.contractor_id, \
     c.user_id AS contractor_user_id, m.request_id, m.template_id, m.status, \
     m.name_revealed, m.revealed_at, m.created_at \
     FROM matches m JOIN contractors c ON c.id = m.contractor_id";

const MESSAGE_SELECT: &str = "SELECT id, match_id, content, is_filtered, consumer_id, \
     contractor_id, created_at FROM messages";

const VISIT_SELECT: &str = "SELECT id, match_id, proposed_slots, scheduled_at, status, \
     created_at, updated_at FROM visits";

impl Storage {
    // =========================================================================
    // Users and contractors
    // =========================================================================

    pub(crate) async fn save_user(&self, user: &User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, ?) \
             ON CONFLICT(email) DO UPDATE SET name = excluded.name, role = excluded.role",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE email = ?")
            .bind(&user.email)
            .fetch_one(self.pool())
            .await?
            .try_into()
    }

    pub(crate) async fn get_user(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(crate) async fn save_contractor(&self, contractor: &Contractor) -> Result<Contractor> {
        sqlx::query(
            "INSERT INTO contractors \
             (id, user_id, company_name, city, rating, review_count, specialties, verified) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(company_name) DO UPDATE SET \
             user_id = excluded.user_id, city = excluded.city, rating = excluded.rating, \
             review_count = excluded.review_count, specialties = excluded.specialties, \
             verified = excluded.verified",
        )
        .bind(&contractor.id)
        .bind(&contractor.user_id)
        .bind(&contractor.company_name)
        .bind(&contractor.city)
        .bind(contractor.rating)
        .bind(contractor.review_count)
        .bind(serde_json::to_string(&contractor.specialties)?)
        .bind(contractor.verified)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, ContractorRow>("SELECT * FROM contractors WHERE company_name = ?")
            .bind(&contractor.company_name)
            .fetch_one(self.pool())
            .await?
            .try_into()
    }

    pub(crate) async fn get_contractor(&self, id: &str) -> Result<Option<Contractor>> {
        sqlx::query_as::<_, ContractorRow>("SELECT * FROM contractors WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(Contractor::try_from)
            .transpose()
    }

    // =========================================================================
    // Requests and matches
    // =========================================================================

    pub(crate) async fn insert_request(&self, request: &RenovationRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO requests (id, consumer_id, template_ids, scope, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.consumer_id)
        .bind(serde_json::to_string(&request.template_ids)?)
        .bind(serde_json::to_string(&request.scope)?)
        .bind(encode_time(request.created_at)?)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub(crate) async fn get_request(&self, id: &str) -> Result<Option<RenovationRequest>> {
        sqlx::query_as::<_, RequestRow>("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(RenovationRequest::try_from)
            .transpose()
    }

    pub(crate) async fn insert_matches(&self, matches: &[Match]) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        for m in matches {
            sqlx::query(
                "INSERT INTO matches (id, consumer_id, contractor_id, request_id, template_id, \
                 status, name_revealed, revealed_at, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&m.id)
            .bind(&m.consumer_id)
            .bind(&m.contractor_id)
            .bind(&m.request_id)
            .bind(&m.template_id)
            .bind(m.status.as_str())
            .bind(m.name_revealed)
            .bind(m.revealed_at.map(encode_time).transpose()?)
            .bind(encode_time(m.created_at)?)
            .execute(&mut *tx)
            .await?;
        }

        // A request is matched once; checked after the inserts hold the write lock.
        let mut requests: Vec<&str> = matches.iter().map(|m| m.request_id.as_str()).collect();
        requests.sort_unstable();
        requests.dedup();
        for request_id in requests {
            let inserted = matches.iter().filter(|m| m.request_id == request_id).count();
            let (total,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM matches WHERE request_id = ?")
                    .bind(request_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if usize::try_from(total).ok() != Some(inserted) {
                return Err(StorageError::Conflict(format!(
                    "request {} already has matches",
                    request_id
                )));
            }
        }

        tx.commit().await?;
        debug!(count = matches.len(), "matches inserted");
        Ok(())
    }

    pub(crate) async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        fetch_match(&mut *self.pool().acquire().await?, id).await
    }

    async fn matches_where(&self, filter: &str, value: &str) -> Result<Vec<Match>> {
        let sql = format!(
            "{} WHERE {} = ? ORDER BY m.created_at, m.rowid",
            MATCH_SELECT, filter
        );
        sqlx::query_as::<_, MatchRow>(&sql)
            .bind(value)
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(Match::try_from)
            .collect()
    }

    pub(crate) async fn matches_for_request(&self, request_id: &str) -> Result<Vec<Match>> {
        self.matches_where("m.request_id", request_id).await
    }

    pub(crate) async fn matches_for_consumer(&self, user_id: &str) -> Result<Vec<Match>> {
        self.matches_where("m.consumer_id", user_id).await
    }

    pub(crate) async fn matches_for_contractor_user(&self, user_id: &str) -> Result<Vec<Match>> {
        self.matches_where("c.user_id", user_id).await
    }

    pub(crate) async fn transition_match(
        &self,
        match_id: &str,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Match> {
        let mut tx = self.pool().begin().await?;
        apply_transition(&mut *tx, match_id, transition, now).await?;
        let updated = fetch_match(&mut *tx, match_id)
            .await?
            .ok_or(StorageError::NotFound("Match"))?;
        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub(crate) async fn insert_message(
        &self,
        message: &Message,
        transition: &Transition,
    ) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        apply_transition(&mut *tx, &message.match_id, transition, message.created_at).await?;

        sqlx::query(
            "INSERT INTO messages \
             (id, match_id, content, is_filtered, consumer_id, contractor_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.match_id)
        .bind(&message.content)
        .bind(message.is_filtered)
        .bind(message.author.consumer_id())
        .bind(message.author.contractor_id())
        .bind(encode_time(message.created_at)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub(crate) async fn messages_for(&self, match_id: &str) -> Result<Vec<Message>> {
        let sql = format!("{} WHERE match_id = ? ORDER BY created_at, rowid", MESSAGE_SELECT);
        sqlx::query_as::<_, MessageRow>(&sql)
            .bind(match_id)
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    pub(crate) async fn messages_since(
        &self,
        match_id: &str,
        since: OffsetDateTime,
    ) -> Result<Vec<Message>> {
        let sql = format!(
            "{} WHERE match_id = ? AND created_at > ? ORDER BY created_at, rowid",
            MESSAGE_SELECT
        );
        sqlx::query_as::<_, MessageRow>(&sql)
            .bind(match_id)
            .bind(encode_time(since)?)
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    // =========================================================================
    // Visits
    // =========================================================================

    pub(crate) async fn get_visit(&self, id: &str) -> Result<Option<Visit>> {
        fetch_visit(&mut *self.pool().acquire().await?, "id", id).await
    }

    pub(crate) async fn visit_for_match(&self, match_id: &str) -> Result<Option<Visit>> {
        fetch_visit(&mut *self.pool().acquire().await?, "match_id", match_id).await
    }

    pub(crate) async fn save_visit_proposal(
        &self,
        match_id: &str,
        slots: &[OffsetDateTime],
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<Visit> {
        let now_ns = encode_time(now)?;
        let mut tx = self.pool().begin().await?;

        apply_transition(&mut *tx, match_id, transition, now).await?;

        sqlx::query(
            "INSERT INTO visits \
             (id, match_id, proposed_slots, scheduled_at, status, created_at, updated_at) \
             VALUES (?, ?, ?, NULL, ?, ?, ?) \
             ON CONFLICT(match_id) DO UPDATE SET \
             proposed_slots = excluded.proposed_slots, scheduled_at = NULL, \
             status = excluded.status, updated_at = excluded.updated_at",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(match_id)
        .bind(encode_slots(slots)?)
        .bind(VisitStatus::Proposed.as_str())
        .bind(now_ns)
        .bind(now_ns)
        .execute(&mut *tx)
        .await?;

        let visit = fetch_visit(&mut *tx, "match_id", match_id)
            .await?
            .ok_or(StorageError::NotFound("Visit"))?;
        tx.commit().await?;
        Ok(visit)
    }

    pub(crate) async fn confirm_visit_slot(
        &self,
        visit_id: &str,
        slot: OffsetDateTime,
        transition: &Transition,
        now: OffsetDateTime,
    ) -> Result<(Visit, Match)> {
        let slot = truncate_to_second(slot);
        let mut tx = self.pool().begin().await?;

        // Write first so the slot check below reads under the write lock.
        let updated = sqlx::query(
            "UPDATE visits SET status = ?, scheduled_at = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(VisitStatus::Confirmed.as_str())
        .bind(encode_time(slot)?)
        .bind(encode_time(now)?)
        .bind(visit_id)
        .bind(VisitStatus::Proposed.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "visit {} is no longer {}",
                visit_id,
                VisitStatus::Proposed
            )));
        }

        let visit = fetch_visit(&mut *tx, "id", visit_id)
            .await?
            .ok_or(StorageError::NotFound("Visit"))?;
        if !visit.offers(slot) {
            return Err(StorageError::Conflict(format!(
                "slot is no longer offered by visit {}",
                visit_id
            )));
        }

        apply_transition(&mut *tx, &visit.match_id, transition, now).await?;

        let visit = fetch_visit(&mut *tx, "id", visit_id)
            .await?
            .ok_or(StorageError::NotFound("Visit"))?;
        let m = fetch_match(&mut *tx, &visit.match_id)
            .await?
            .ok_or(StorageError::NotFound("Match"))?;

        tx.commit().await?;
        Ok((visit, m))
    }
}

async fn fetch_match(conn: &mut SqliteConnection, id: &str) -> Result<Option<Match>> {
    let sql = format!("{} WHERE m.id = ?", MATCH_SELECT);
    sqlx::query_as::<_, MatchRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(Match::try_from)
        .transpose()
}

async fn fetch_visit(conn: &mut SqliteConnection, column: &str, value: &str) -> Result<Option<Visit>> {
    let sql = format!("{} WHERE {} = ?", VISIT_SELECT, column);
    sqlx::query_as::<_, VisitRow>(&sql)
        .bind(value)
        .fetch_optional(conn)
        .await?
        .map(Visit::try_from)
        .transpose()
}

/// Guarded status update plus every side effect of `transition`.
async fn apply_transition(
    conn: &mut SqliteConnection,
    match_id: &str,
    transition: &Transition,
    now: OffsetDateTime,
) -> Result<()> {
    let now_ns = encode_time(now)?;

    let updated = sqlx::query(
        "UPDATE matches SET status = ?, \
         name_revealed = CASE WHEN ? THEN 1 ELSE name_revealed END, \
         revealed_at = CASE WHEN ? THEN COALESCE(revealed_at, ?) ELSE revealed_at END \
         WHERE id = ? AND status = ?",
    )
    .bind(transition.to.as_str())
    .bind(transition.reveal)
    .bind(transition.reveal)
    .bind(now_ns)
    .bind(match_id)
    .bind(transition.from.as_str())
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(StorageError::Conflict(format!(
            "match {} is no longer {}",
            match_id, transition.from
        )));
    }

    if let Some(visit_status) = transition.visit {
        sqlx::query(
            "UPDATE visits SET status = ?, \
             scheduled_at = CASE WHEN ? THEN NULL ELSE scheduled_at END, updated_at = ? \
             WHERE match_id = ? AND status IN (?, ?)",
        )
        .bind(visit_status.as_str())
        .bind(visit_status == VisitStatus::Cancelled)
        .bind(now_ns)
        .bind(match_id)
        .bind(VisitStatus::Proposed.as_str())
        .bind(VisitStatus::Confirmed.as_str())
        .execute(&mut *conn)
        .await?;
    }

    if transition.cancel_rivals {
        let cancelled = sqlx::query(
            "UPDATE matches SET status = 'CANCELLED' \
             WHERE request_id = (SELECT request_id FROM matches WHERE id = ?) \
             AND id <> ? AND status = 'MATCHED'",
        )
        .bind(match_id)
        .bind(match_id)
        .execute(&mut *conn)
        .await?;

        if cancelled.rows_affected() > 0 {
            info!(
                match_id,
                cancelled = cancelled.rows_affected(),
                "rival matches cancelled"
            );
        }
    }

    Ok(())
}
