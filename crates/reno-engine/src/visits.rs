use reno_core::{
    Caller, CoreError, MatchEvent, Result, Visit, VisitStatus, plan, visit::truncate_to_second,
};
use time::OffsetDateTime;
use tracing::info;

use crate::{Marketplace, MatchView};

impl Marketplace {
    /// Either participant may propose; a new proposal replaces the slot list
    /// of an open one.
    pub async fn propose_visit(
        &self,
        caller: &Caller,
        match_id: &str,
        slots: Vec<OffsetDateTime>,
    ) -> Result<Visit> {
        let m = self.participating_match(caller, match_id).await?;

        let max = self.limits.max_proposed_slots;
        if slots.is_empty() || slots.len() > max {
            return Err(CoreError::validation(format!(
                "Provide between 1 and {} time slots",
                max
            )));
        }

        let slots: Vec<OffsetDateTime> = slots.into_iter().map(truncate_to_second).collect();
        let now = OffsetDateTime::now_utc();
        if slots.iter().any(|slot| *slot <= now) {
            return Err(CoreError::validation(
                "All proposed slots must be in the future",
            ));
        }

        let transition = plan(m.status, MatchEvent::VisitProposed)?;
        let visit = self
            .store
            .propose_visit(&m.id, &slots, &transition, now)
            .await?;

        info!(match_id = %m.id, visit_id = %visit.id, slots = slots.len(), "visit proposed");
        Ok(visit)
    }

    /// Consumer picks one of the proposed slots. Confirms the visit and
    /// reveals both identities in one step.
    pub async fn accept_visit(
        &self,
        caller: &Caller,
        visit_id: &str,
        slot: OffsetDateTime,
    ) -> Result<(Visit, MatchView)> {
        let visit = self
            .store
            .find_visit(visit_id)
            .await?
            .ok_or(CoreError::NotFound("Visit"))?;

        let m = self
            .participating_match(caller, &visit.match_id)
            .await
            .map_err(|err| match err {
                CoreError::NotFound(_) => CoreError::NotFound("Visit"),
                other => other,
            })?;
        if !matches!(caller, Caller::Consumer { .. }) {
            return Err(CoreError::NotFound("Visit"));
        }

        let slot = truncate_to_second(slot);
        if visit.status != VisitStatus::Proposed {
            return Err(CoreError::validation(format!(
                "Visit is {}, not awaiting confirmation",
                visit.status
            )));
        }
        if !visit.offers(slot) {
            return Err(CoreError::validation(
                "Selected slot is not one of the proposed slots",
            ));
        }

        let now = OffsetDateTime::now_utc();
        if slot <= now {
            return Err(CoreError::validation("Selected slot is in the past"));
        }

        let transition = plan(m.status, MatchEvent::VisitAccepted)?;
        let (visit, updated) = self
            .store
            .confirm_visit(&visit.id, slot, &transition, now)
            .await?;

        info!(match_id = %updated.id, visit_id = %visit.id, "visit confirmed, identities revealed");

        let label = self.label_of(&updated).await?;
        let mut view = self.view(caller, &updated, label).await?;
        view.visit = Some(visit.clone());
        Ok((visit, view))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::scene;
    use reno_core::{CoreError, MatchStatus, VisitStatus, visit::truncate_to_second};
    use time::{Duration, OffsetDateTime};

    fn future(hours: i64) -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::hours(hours)
    }

    #[tokio::test]
    async fn test_accepting_a_slot_reveals_identity() {
        let s = scene().await;
        let match_id = &s.matches[0].id;
        let (t1, t2) = (future(24), future(48));

        let visit = s
            .market
            .propose_visit(&s.owner, match_id, vec![t1, t2])
            .await
            .unwrap();
        assert_eq!(visit.status, VisitStatus::Proposed);

        let (visit, view) = s.market.accept_visit(&s.consumer, &visit.id, t1).await.unwrap();
        assert_eq!(visit.status, VisitStatus::Confirmed);
        assert_eq!(visit.scheduled_at, Some(truncate_to_second(t1)));
        assert_eq!(view.status, MatchStatus::VisitConfirmed);
        assert!(view.name_revealed);
        assert!(view.revealed_at.is_some());
        assert_eq!(
            view.contractor.company_name.as_deref(),
            Some("Renovatie Pro Zwolle")
        );

        // the contractor now sees the consumer's name
        let theirs = s.market.get_match(&s.owner, match_id).await.unwrap();
        assert_eq!(theirs.consumer_name.as_deref(), Some("Jan van der Berg"));

        // and chat is no longer sanitized
        let sent = s
            .market
            .send_message(&s.owner, match_id, "Bel me op 06-12345678")
            .await
            .unwrap();
        assert!(!sent.is_filtered);
        assert_eq!(sent.content, "Bel me op 06-12345678");
    }

    #[tokio::test]
    async fn test_sub_second_slot_round_trips() {
        let s = scene().await;
        let slot = OffsetDateTime::now_utc() + Duration::hours(24) + Duration::nanoseconds(582_875_984);

        let visit = s
            .market
            .propose_visit(&s.owner, &s.matches[0].id, vec![slot])
            .await
            .unwrap();
        assert_eq!(visit.proposed_slots, vec![truncate_to_second(slot)]);

        let (visit, _) = s.market.accept_visit(&s.consumer, &visit.id, slot).await.unwrap();
        assert_eq!(visit.status, VisitStatus::Confirmed);
        assert_eq!(visit.scheduled_at, Some(truncate_to_second(slot)));
    }

    #[tokio::test]
    async fn test_slot_outside_proposal_changes_nothing() {
        let s = scene().await;
        let match_id = &s.matches[0].id;
        let (t1, t2) = (future(24), future(48));

        let visit = s
            .market
            .propose_visit(&s.consumer, match_id, vec![t1, t2])
            .await
            .unwrap();

        let err = s
            .market
            .accept_visit(&s.consumer, &visit.id, future(72))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let stored = s.market.store().find_visit(&visit.id).await.unwrap().unwrap();
        assert_eq!(stored.status, VisitStatus::Proposed);
        assert!(stored.scheduled_at.is_none());
        let m = s.market.get_match(&s.consumer, match_id).await.unwrap();
        assert_eq!(m.status, MatchStatus::VisitProposed);
        assert!(!m.name_revealed);
        assert!(m.contractor.company_name.is_none());
    }

    #[tokio::test]
    async fn test_only_consumer_accepts() {
        let s = scene().await;
        let t1 = future(24);
        let visit = s
            .market
            .propose_visit(&s.consumer, &s.matches[0].id, vec![t1])
            .await
            .unwrap();

        let err = s.market.accept_visit(&s.owner, &visit.id, t1).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Visit")));

        let err = s.market.accept_visit(&s.stranger, &visit.id, t1).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Visit")));
    }

    #[tokio::test]
    async fn test_proposal_slot_rules() {
        let s = scene().await;
        let match_id = &s.matches[0].id;

        let err = s
            .market
            .propose_visit(&s.consumer, match_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let six = (1..=6).map(future).collect();
        let err = s
            .market
            .propose_visit(&s.consumer, match_id, six)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = s
            .market
            .propose_visit(&s.consumer, match_id, vec![future(24), future(-1)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        // nothing was written
        assert!(
            s.market
                .store()
                .find_visit_for_match(match_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_proposal_cancels_rivals_and_reproposal_replaces() {
        let s = scene().await;
        let match_id = &s.matches[2].id;

        let first = s
            .market
            .propose_visit(&s.consumer, match_id, vec![future(24)])
            .await
            .unwrap();
        let rival = s.market.get_match(&s.consumer, &s.matches[0].id).await.unwrap();
        assert_eq!(rival.status, MatchStatus::Cancelled);

        let replacement = vec![future(30), future(31)];
        let second = s
            .market
            .propose_visit(&s.consumer, match_id, replacement.clone())
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        let stored: Vec<_> = replacement.into_iter().map(truncate_to_second).collect();
        assert_eq!(second.proposed_slots, stored);

        let err = s
            .market
            .accept_visit(&s.consumer, &second.id, future(24))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_decline_cancels_open_visit() {
        let s = scene().await;
        let visit = s
            .market
            .propose_visit(&s.consumer, &s.matches[1].id, vec![future(24)])
            .await
            .unwrap();

        let declined = s
            .market
            .decline_match(&s.consumer, &s.matches[1].id)
            .await
            .unwrap();
        assert_eq!(declined.status, MatchStatus::Declined);

        let visit = s.market.store().find_visit(&visit.id).await.unwrap().unwrap();
        assert_eq!(visit.status, VisitStatus::Cancelled);
        assert!(visit.scheduled_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_closes_confirmed_visit() {
        let s = scene().await;
        let t1 = future(24);

        let visit = s
            .market
            .propose_visit(&s.owner, &s.matches[0].id, vec![t1])
            .await
            .unwrap();
        s.market.accept_visit(&s.consumer, &visit.id, t1).await.unwrap();

        let done = s
            .market
            .complete_match(&s.consumer, &s.matches[0].id)
            .await
            .unwrap();
        assert_eq!(done.status, MatchStatus::Completed);
        assert!(done.name_revealed);
        let visit = s.market.store().find_visit(&visit.id).await.unwrap().unwrap();
        assert_eq!(visit.status, VisitStatus::Completed);
        assert_eq!(visit.scheduled_at, Some(truncate_to_second(t1)));

        let err = s
            .market
            .decline_match(&s.consumer, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }
}
