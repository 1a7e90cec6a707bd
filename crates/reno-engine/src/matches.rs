use std::collections::{HashMap, HashSet};

use reno_core::{
    Caller, CoreError, Match, MatchEvent, RenovationRequest, Result, contractor_label,
    disclosure::disclose, label_for, plan,
};
use time::OffsetDateTime;
use tracing::info;

use crate::{ContractorView, MatchView, Marketplace};

/// Contractors per request, and templates per request.
const SET_SIZE: usize = 3;

fn distinct(ids: &[String]) -> bool {
    let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
    unique.len() == ids.len() && ids.iter().all(|id| !id.trim().is_empty())
}

impl Marketplace {
    pub async fn create_request(
        &self,
        caller: &Caller,
        template_ids: Vec<String>,
        scope: Vec<String>,
    ) -> Result<RenovationRequest> {
        let Caller::Consumer { user_id } = caller else {
            return Err(CoreError::validation("Only consumers can create requests"));
        };

        if template_ids.len() != SET_SIZE || !distinct(&template_ids) {
            return Err(CoreError::validation(format!(
                "Exactly {} different templates must be selected",
                SET_SIZE
            )));
        }

        let request = RenovationRequest::new(user_id.clone(), template_ids, scope);
        self.store.create_request(&request).await?;

        info!(request_id = %request.id, "request created");
        Ok(request)
    }

    /// Pair a request with the given contractors. Which contractors to pick
    /// is up to the caller.
    pub async fn create_matches(
        &self,
        caller: &Caller,
        request_id: &str,
        contractor_ids: &[String],
    ) -> Result<Vec<MatchView>> {
        let request = match self.store.find_request(request_id).await? {
            Some(request) if caller.owns_request(&request) => request,
            _ => return Err(CoreError::NotFound("Request")),
        };

        if !self.store.list_matches_for_request(&request.id).await?.is_empty() {
            return Err(CoreError::validation("Matches already exist for this request"));
        }

        if contractor_ids.len() != SET_SIZE || !distinct(contractor_ids) {
            return Err(CoreError::validation(format!(
                "Exactly {} different contractors are required",
                SET_SIZE
            )));
        }

        let mut contractors = Vec::with_capacity(contractor_ids.len());
        for id in contractor_ids {
            match self.store.find_contractor(id).await? {
                Some(c) if c.verified => contractors.push(c),
                _ => {
                    return Err(CoreError::validation(format!(
                        "Contractor {} is not available",
                        id
                    )));
                }
            }
        }

        let created = OffsetDateTime::now_utc();
        let matches: Vec<Match> = contractors
            .iter()
            .zip(0i64..)
            .map(|(contractor, offset)| {
                let mut m = Match::new(request.consumer_id.clone(), contractor, request.id.clone())
                    .with_template(request.primary_template().map(str::to_string));
                // strictly increasing, so creation order is the label order
                m.created_at = created + time::Duration::microseconds(offset);
                m
            })
            .collect();

        self.store.create_matches(&matches).await?;
        info!(request_id = %request.id, count = matches.len(), "matches created");

        let views = matches
            .iter()
            .zip(&contractors)
            .enumerate()
            .map(|(index, (m, contractor))| {
                MatchView::new(
                    m,
                    ContractorView {
                        label: contractor_label(index),
                        profile: contractor.profile(),
                        company_name: None,
                    },
                )
            })
            .collect();

        Ok(views)
    }

    /// Every match the caller takes part in, labelled within its request.
    pub async fn list_matches(&self, caller: &Caller) -> Result<Vec<MatchView>> {
        let matches = match caller {
            Caller::Consumer { user_id } => self.store.list_matches_for_consumer(user_id).await?,
            Caller::Contractor { user_id } => {
                self.store.list_matches_for_contractor_user(user_id).await?
            }
        };

        let mut orderings: HashMap<String, Vec<Match>> = HashMap::new();
        let mut views = Vec::with_capacity(matches.len());

        for m in &matches {
            if !orderings.contains_key(&m.request_id) {
                let ordered = self.store.list_matches_for_request(&m.request_id).await?;
                orderings.insert(m.request_id.clone(), ordered);
            }
            let label = orderings
                .get(&m.request_id)
                .and_then(|ordered| label_for(ordered, &m.id))
                .ok_or(CoreError::NotFound("Match"))?;

            views.push(self.view(caller, m, label).await?);
        }

        Ok(views)
    }

    pub async fn get_match(&self, caller: &Caller, match_id: &str) -> Result<MatchView> {
        let m = self.participating_match(caller, match_id).await?;
        let label = self.label_of(&m).await?;

        let mut view = self.view(caller, &m, label).await?;
        view.visit = self.store.find_visit_for_match(&m.id).await?;
        Ok(view)
    }

    pub async fn decline_match(&self, caller: &Caller, match_id: &str) -> Result<MatchView> {
        let m = self.participating_match(caller, match_id).await?;
        let transition = plan(m.status, MatchEvent::Declined)?;

        let updated = self
            .store
            .apply_transition(&m.id, &transition, OffsetDateTime::now_utc())
            .await?;
        info!(match_id = %m.id, from = %m.status, "match declined");

        let label = self.label_of(&updated).await?;
        self.view(caller, &updated, label).await
    }

    /// Consumer only; the visit must have been confirmed.
    pub async fn complete_match(&self, caller: &Caller, match_id: &str) -> Result<MatchView> {
        let m = self.participating_match(caller, match_id).await?;
        if !matches!(caller, Caller::Consumer { .. }) {
            return Err(CoreError::NotFound("Match"));
        }

        let transition = plan(m.status, MatchEvent::Completed)?;
        let updated = self
            .store
            .apply_transition(&m.id, &transition, OffsetDateTime::now_utc())
            .await?;
        info!(match_id = %m.id, "match completed");

        let label = self.label_of(&updated).await?;
        self.view(caller, &updated, label).await
    }

    pub(crate) async fn view(&self, caller: &Caller, m: &Match, label: String) -> Result<MatchView> {
        let contractor = self
            .store
            .find_contractor(&m.contractor_id)
            .await?
            .ok_or(CoreError::NotFound("Contractor"))?;

        let mut view = MatchView::new(
            m,
            ContractorView {
                label,
                profile: contractor.profile(),
                company_name: disclose(m, || contractor.company_name.clone()),
            },
        );

        if let Caller::Contractor { .. } = caller
            && let Some(consumer_id) = disclose(m, || m.consumer_id.clone())
        {
            view.consumer_name = self.store.find_user(&consumer_id).await?.map(|u| u.name);
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::scene;
    use reno_core::{Caller, CoreError, MatchStatus, Role};

    #[tokio::test]
    async fn test_created_matches_are_anonymous_and_labelled() {
        let s = scene().await;

        let labels: Vec<_> = s.matches.iter().map(|m| m.contractor.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "C"]);
        for m in &s.matches {
            assert_eq!(m.status, MatchStatus::Matched);
            assert!(!m.name_revealed);
            assert!(m.contractor.company_name.is_none());
            assert_eq!(m.template_id.as_deref(), Some("badkamer"));
        }
        assert_eq!(s.matches[1].contractor.profile.city, "Deventer");
    }

    #[tokio::test]
    async fn test_labels_agree_across_surfaces() {
        let s = scene().await;

        let listed = s.market.list_matches(&s.consumer).await.unwrap();
        assert_eq!(listed.len(), 3);
        for (created, listed) in s.matches.iter().zip(&listed) {
            assert_eq!(created.id, listed.id);
            assert_eq!(created.contractor.label, listed.contractor.label);
        }

        let owned = s.market.list_matches(&s.owner).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].contractor.label, "A");

        let viewed = s.market.get_match(&s.consumer, &s.matches[2].id).await.unwrap();
        assert_eq!(viewed.contractor.label, "C");
    }

    #[tokio::test]
    async fn test_request_needs_three_distinct_templates() {
        let s = scene().await;

        for templates in [
            vec!["a", "b"],
            vec!["a", "a", "b"],
            vec!["a", "b", "c", "d"],
        ] {
            let err = s
                .market
                .create_request(
                    &s.consumer,
                    templates.into_iter().map(str::to_string).collect(),
                    vec![],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }

        let err = s
            .market
            .create_request(
                &s.owner,
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec![],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_matches_only_once_per_request() {
        let s = scene().await;
        let ids: Vec<String> = s.contractors.iter().map(|c| c.id.clone()).collect();

        let err = s
            .market
            .create_matches(&s.consumer, &s.request.id, &ids)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = s
            .market
            .create_matches(&s.stranger, &s.request.id, &ids)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Request")));
    }

    #[tokio::test]
    async fn test_unverified_contractor_rejected() {
        let s = scene().await;
        let request = s
            .market
            .create_request(
                &s.consumer,
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec![],
            )
            .await
            .unwrap();

        let unverified = s
            .market
            .store()
            .upsert_contractor(&reno_core::Contractor::new(
                "Nog Niet Geverifieerd".to_string(),
                "Almelo".to_string(),
            ))
            .await
            .unwrap();

        let ids = vec![
            s.contractors[0].id.clone(),
            s.contractors[1].id.clone(),
            unverified.id,
        ];
        let err = s
            .market
            .create_matches(&s.consumer, &request.id, &ids)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(
            s.market
                .store()
                .list_matches_for_request(&request.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_foreign_match_looks_missing() {
        let s = scene().await;

        let err = s
            .market
            .get_match(&s.stranger, &s.matches[0].id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Match not found or access denied");

        let outsider = Caller::new("nobody", Role::Contractor);
        let err = s
            .market
            .get_match(&outsider, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Match")));

        let err = s.market.get_match(&s.consumer, "missing").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Match")));
    }

    #[tokio::test]
    async fn test_decline_is_terminal() {
        let s = scene().await;

        let declined = s
            .market
            .decline_match(&s.owner, &s.matches[0].id)
            .await
            .unwrap();
        assert_eq!(declined.status, MatchStatus::Declined);

        let err = s
            .market
            .decline_match(&s.consumer, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        // rivals are untouched by a decline
        let other = s.market.get_match(&s.consumer, &s.matches[1].id).await.unwrap();
        assert_eq!(other.status, MatchStatus::Matched);
    }

    #[tokio::test]
    async fn test_complete_requires_confirmed_visit() {
        let s = scene().await;

        let err = s
            .market
            .complete_match(&s.consumer, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        let err = s
            .market
            .complete_match(&s.owner, &s.matches[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
