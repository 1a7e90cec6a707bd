//! Request-scoped marketplace operations
//!
//! `Marketplace` wires the store, the sanitizer, the disclosure policy, the
//! rate limiter and the lifecycle planner together. Every operation takes
//! the authenticated [`Caller`] and checks participation before touching
//! anything.

mod chat;
mod matches;
mod views;
mod visits;

use std::sync::Arc;
use std::time::Duration;

use reno_core::{
    Caller, CoreError, MarketStore, Match, MessageRateLimiter, Result, label_for,
};
use reno_security::Sanitizer;
use serde::Serialize;
use tracing::warn;

pub use views::{ContractorView, MatchView, MessageThread};

/// Chat and visit limits not covered by the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLimits {
    pub max_message_chars: usize,
    pub max_proposed_slots: usize,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            max_message_chars: 1000,
            max_proposed_slots: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub latency_ms: u64,
}

pub struct Marketplace {
    store: Arc<dyn MarketStore>,
    sanitizer: Arc<Sanitizer>,
    limiter: MessageRateLimiter,
    limits: ChatLimits,
}

impl Marketplace {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self {
            store,
            sanitizer: Arc::new(Sanitizer::new()),
            limiter: MessageRateLimiter::default(),
            limits: ChatLimits::default(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Arc::new(sanitizer);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: MessageRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_limits(mut self, limits: ChatLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub async fn health(&self) -> Result<Health> {
        let latency: Duration = self.store.ping().await?;
        Ok(Health {
            status: "healthy",
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// The match, if `caller` takes part in it. Absence and foreign matches
    /// are the same error.
    async fn participating_match(&self, caller: &Caller, match_id: &str) -> Result<Match> {
        match self.store.find_match(match_id).await? {
            Some(m) if caller.participates_in(&m) => Ok(m),
            Some(_) => {
                warn!(match_id, user_id = caller.user_id(), "match access denied");
                Err(CoreError::NotFound("Match"))
            }
            None => Err(CoreError::NotFound("Match")),
        }
    }

    async fn label_of(&self, m: &Match) -> Result<String> {
        let ordered = self.store.list_matches_for_request(&m.request_id).await?;
        label_for(&ordered, &m.id).ok_or(CoreError::NotFound("Match"))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use reno_core::{Contractor, RenovationRequest, Role, User};
    use reno_storage::Storage;

    pub struct Scene {
        pub market: Marketplace,
        pub consumer: Caller,
        pub owner: Caller,
        pub stranger: Caller,
        pub contractors: Vec<Contractor>,
        pub request: RenovationRequest,
        pub matches: Vec<crate::MatchView>,
    }

    /// One consumer, one request and three matches; the first contractor is
    /// owned by `owner`.
    pub async fn scene() -> Scene {
        let store = Storage::in_memory().await.unwrap();
        let market = Marketplace::new(Arc::new(store));

        let consumer = market
            .store()
            .upsert_user(&User::new(
                "Jan van der Berg".to_string(),
                "jan@renovibez.nl".to_string(),
                Role::Consumer,
            ))
            .await
            .unwrap();
        let owner = market
            .store()
            .upsert_user(&User::new(
                "Piet Bakker".to_string(),
                "piet@renovatiepro.nl".to_string(),
                Role::Contractor,
            ))
            .await
            .unwrap();
        let stranger = market
            .store()
            .upsert_user(&User::new(
                "Maria Jansen".to_string(),
                "maria@renovibez.nl".to_string(),
                Role::Consumer,
            ))
            .await
            .unwrap();

        let mut contractors = Vec::new();
        for (i, (name, city)) in [
            ("Renovatie Pro Zwolle", "Zwolle"),
            ("Bouwbedrijf De Vakman", "Deventer"),
            ("Eco Bouw Kampen", "Kampen"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut c = Contractor::new(name.to_string(), city.to_string());
            c.verified = true;
            c.rating = 4.5;
            c.review_count = 10;
            if i == 0 {
                c.user_id = Some(owner.id.clone());
            }
            contractors.push(market.store().upsert_contractor(&c).await.unwrap());
        }

        let consumer = Caller::new(consumer.id, Role::Consumer);
        let request = market
            .create_request(
                &consumer,
                vec!["badkamer".to_string(), "keuken".to_string(), "zolder".to_string()],
                vec!["tegels".to_string()],
            )
            .await
            .unwrap();

        let ids: Vec<String> = contractors.iter().map(|c| c.id.clone()).collect();
        let matches = market
            .create_matches(&consumer, &request.id, &ids)
            .await
            .unwrap();

        Scene {
            market,
            consumer,
            owner: Caller::new(owner.id, Role::Contractor),
            stranger: Caller::new(stranger.id, Role::Consumer),
            contractors,
            request,
            matches,
        }
    }
}
