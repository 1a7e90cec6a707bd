use reno_core::{
    Caller, CoreError, MatchEvent, Message, Result,
    disclosure::{should_sanitize_on_read, should_sanitize_outbound},
    plan,
};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{Marketplace, MessageThread};

impl Marketplace {
    /// Admit, sanitize and store one chat message.
    ///
    /// Order: participation, lifecycle, rate limit, sanitize, persist. A
    /// rejected message leaves no record and no status change.
    pub async fn send_message(
        &self,
        caller: &Caller,
        match_id: &str,
        content: &str,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(CoreError::validation("Message content is required"));
        }
        if content.chars().count() > self.limits.max_message_chars {
            return Err(CoreError::validation(format!(
                "Message too long (max {} characters)",
                self.limits.max_message_chars
            )));
        }

        let m = self.participating_match(caller, match_id).await?;
        let transition = plan(m.status, MatchEvent::MessageSent)?;

        let author = caller.author_in(&m);
        let now = OffsetDateTime::now_utc();
        let recent = self
            .store
            .list_recent_messages(&m.id, self.limiter.lookback(now))
            .await?;
        if let Err(err) = self.limiter.check(&author, &recent, now) {
            warn!(match_id = %m.id, user_id = caller.user_id(), "message throttled");
            return Err(err);
        }

        let sanitized = self
            .sanitizer
            .sanitize(content, should_sanitize_outbound(&m));

        let message = Message::new(m.id.clone(), author, sanitized.text, sanitized.is_filtered)
            .with_created_at(now);
        self.store.create_message(&message, &transition).await?;

        if transition.changes_status() {
            info!(match_id = %m.id, from = %transition.from, to = %transition.to, "match status changed");
        }

        Ok(message)
    }

    /// The thread in creation order. Messages stored unsanitized while the
    /// match is still anonymous are redacted on the way out.
    pub async fn list_messages(&self, caller: &Caller, match_id: &str) -> Result<MessageThread> {
        let m = self.participating_match(caller, match_id).await?;
        let label = self.label_of(&m).await?;

        let messages = self
            .store
            .list_messages(&m.id)
            .await?
            .into_iter()
            .map(|mut message| {
                if should_sanitize_on_read(&m, &message) {
                    let redacted = self.sanitizer.sanitize(&message.content, true);
                    message.content = redacted.text;
                    message.is_filtered = redacted.is_filtered;
                }
                message
            })
            .collect();

        Ok(MessageThread {
            match_id: m.id,
            label,
            name_revealed: m.name_revealed,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::scene;
    use reno_core::{Author, CoreError, MatchEvent, MatchStatus, Message, plan};
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_anonymous_message_is_sanitized_before_storage() {
        let s = scene().await;
        let match_id = &s.matches[0].id;

        let sent = s
            .market
            .send_message(
                &s.consumer,
                match_id,
                "Bel mij op 06-12345678 of mail naar jan@bedrijf.nl",
            )
            .await
            .unwrap();

        assert!(sent.is_filtered);
        let stored = &s.market.store().list_messages(match_id).await.unwrap()[0];
        assert!(!stored.content.contains('@'));
        assert!(!stored.content.contains("12345678"));
        assert!(stored.is_filtered);
    }

    #[tokio::test]
    async fn test_clean_message_is_not_flagged() {
        let s = scene().await;

        let sent = s
            .market
            .send_message(&s.owner, &s.matches[0].id, "  Wanneer wilt u beginnen?  ")
            .await
            .unwrap();

        assert!(!sent.is_filtered);
        assert_eq!(sent.content, "Wanneer wilt u beginnen?");
        assert_eq!(sent.author, Author::Contractor(s.contractors[0].id.clone()));
    }

    #[tokio::test]
    async fn test_first_message_cancels_rivals() {
        let s = scene().await;
        let chosen = &s.matches[1];

        s.market
            .send_message(&s.consumer, &chosen.id, "Hallo, heeft u tijd?")
            .await
            .unwrap();

        let listed = s.market.list_matches(&s.consumer).await.unwrap();
        let status_of = |id: &str| listed.iter().find(|m| m.id == id).unwrap().status;
        assert_eq!(status_of(chosen.id.as_str()), MatchStatus::Chatting);
        assert_eq!(status_of(s.matches[0].id.as_str()), MatchStatus::Cancelled);
        assert_eq!(status_of(s.matches[2].id.as_str()), MatchStatus::Cancelled);

        for rival in [&s.matches[0], &s.matches[2]] {
            let err = s
                .market
                .send_message(&s.consumer, &rival.id, "nog iemand?")
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
            assert!(err.is_client_error());
        }
    }

    #[tokio::test]
    async fn test_message_validation() {
        let s = scene().await;
        let match_id = &s.matches[0].id;

        let err = s.market.send_message(&s.consumer, match_id, "   ").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let long = "a".repeat(1001);
        let err = s.market.send_message(&s.consumer, match_id, &long).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        // the cap counts characters, not bytes
        let accented = "é".repeat(1000);
        assert!(s.market.send_message(&s.consumer, match_id, &accented).await.is_ok());
    }

    #[tokio::test]
    async fn test_sixth_message_in_a_minute_is_throttled() {
        let s = scene().await;
        let match_id = &s.matches[0].id;

        for i in 0..5 {
            s.market
                .send_message(&s.consumer, match_id, &format!("bericht {}", i))
                .await
                .unwrap();
        }
        let err = s
            .market
            .send_message(&s.consumer, match_id, "nog eentje")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RateLimited(_)));
        assert_eq!(s.market.store().list_messages(match_id).await.unwrap().len(), 5);

        // the other side has its own budget
        assert!(
            s.market
                .send_message(&s.owner, match_id, "geen probleem")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_twenty_first_message_in_five_minutes_is_throttled() {
        let s = scene().await;
        let match_id = &s.matches[0].id;
        let store = s.market.store();
        let author = Author::Consumer(s.consumer.user_id().to_string());
        let two_minutes_ago = OffsetDateTime::now_utc() - time::Duration::minutes(2);

        for i in 0..20 {
            let current = store.find_match(match_id).await.unwrap().unwrap();
            let t = plan(current.status, MatchEvent::MessageSent).unwrap();
            let message = Message::new(
                match_id.clone(),
                author.clone(),
                format!("eerder {}", i),
                false,
            )
            .with_created_at(two_minutes_ago + time::Duration::seconds(i));
            store.create_message(&message, &t).await.unwrap();
        }

        let err = s
            .market
            .send_message(&s.consumer, match_id, "nu")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_read_time_safety_net() {
        let s = scene().await;
        let match_id = &s.matches[0].id;
        let store = s.market.store();

        // written without going through the sanitizer
        let t = plan(MatchStatus::Matched, MatchEvent::MessageSent).unwrap();
        let raw = Message::new(
            match_id.clone(),
            Author::Consumer(s.consumer.user_id().to_string()),
            "mail me op jan@bedrijf.nl".to_string(),
            false,
        );
        store.create_message(&raw, &t).await.unwrap();

        let thread = s.market.list_messages(&s.owner, match_id).await.unwrap();
        assert_eq!(thread.label, "A");
        assert!(!thread.name_revealed);
        assert_eq!(thread.messages.len(), 1);
        assert!(!thread.messages[0].content.contains('@'));
        assert!(thread.messages[0].is_filtered);

        // storage keeps what was written
        let stored = &store.list_messages(match_id).await.unwrap()[0];
        assert!(stored.content.contains('@'));
    }

    #[tokio::test]
    async fn test_stranger_cannot_read_thread() {
        let s = scene().await;
        let err = s
            .market
            .list_messages(&s.stranger, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Match")));
    }
}
