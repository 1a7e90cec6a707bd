//! Match lifecycle state machine
//!
//! ```text
//! MATCHED -> CHATTING -> VISIT_PROPOSED -> VISIT_CONFIRMED -> COMPLETED
//!    \__________\______________\________________\___> DECLINED | CANCELLED
//! ```
//!
//! `plan` is pure: it validates an event against the current status and
//! returns the full set of effects as a [`Transition`]. Stores apply a
//! transition atomically together with the write that triggered it, with
//! the match update guarded on `from`.

use time::OffsetDateTime;

use crate::{CoreError, Match, MatchStatus, Result, VisitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    MessageSent,
    VisitProposed,
    VisitAccepted,
    Declined,
    Cancelled,
    Completed,
}

impl MatchEvent {
    fn action(&self) -> &'static str {
        match self {
            Self::MessageSent => "send a message in",
            Self::VisitProposed => "propose a visit for",
            Self::VisitAccepted => "accept a visit for",
            Self::Declined => "decline",
            Self::Cancelled => "cancel",
            Self::Completed => "complete",
        }
    }
}

/// Effects of one lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MatchStatus,
    pub to: MatchStatus,
    /// Set `name_revealed` (never cleared once set)
    pub reveal: bool,
    /// Cancel every other still-`MATCHED` match of the same request
    pub cancel_rivals: bool,
    /// New status for the match's open visit, if any
    pub visit: Option<VisitStatus>,
}

impl Transition {
    fn step(from: MatchStatus, to: MatchStatus) -> Self {
        Self {
            from,
            to,
            reveal: false,
            cancel_rivals: to.is_escalated(),
            visit: None,
        }
    }

    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }

    /// In-memory counterpart of what a store does in its transaction.
    pub fn apply(&self, m: &mut Match, now: OffsetDateTime) -> Result<()> {
        if m.status != self.from {
            return Err(CoreError::StateConflict(format!(
                "match {} is {}, expected {}",
                m.id, m.status, self.from
            )));
        }
        m.status = self.to;
        if self.reveal {
            m.reveal(now);
        }
        Ok(())
    }
}

pub fn plan(from: MatchStatus, event: MatchEvent) -> Result<Transition> {
    use MatchStatus::*;

    let transition = match (event, from) {
        (_, Completed | Declined | Cancelled) => None,

        (MatchEvent::MessageSent, Matched) => Some(Transition::step(from, Chatting)),
        (MatchEvent::MessageSent, _) => Some(Transition::step(from, from)),

        (MatchEvent::VisitProposed, Matched | Chatting | VisitProposed) => {
            Some(Transition::step(from, VisitProposed))
        }

        (MatchEvent::VisitAccepted, VisitProposed) => Some(Transition {
            reveal: true,
            ..Transition::step(from, VisitConfirmed)
        }),

        (MatchEvent::Declined, _) => Some(Transition {
            visit: Some(VisitStatus::Cancelled),
            ..Transition::step(from, Declined)
        }),
        (MatchEvent::Cancelled, _) => Some(Transition {
            visit: Some(VisitStatus::Cancelled),
            ..Transition::step(from, Cancelled)
        }),

        (MatchEvent::Completed, VisitConfirmed) => Some(Transition {
            visit: Some(VisitStatus::Completed),
            ..Transition::step(from, Completed)
        }),

        _ => None,
    };

    transition.ok_or(CoreError::InvalidTransition {
        from,
        action: event.action(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Contractor;

    const ALL: [MatchStatus; 7] = [
        MatchStatus::Matched,
        MatchStatus::Chatting,
        MatchStatus::VisitProposed,
        MatchStatus::VisitConfirmed,
        MatchStatus::Completed,
        MatchStatus::Declined,
        MatchStatus::Cancelled,
    ];

    const EVENTS: [MatchEvent; 6] = [
        MatchEvent::MessageSent,
        MatchEvent::VisitProposed,
        MatchEvent::VisitAccepted,
        MatchEvent::Declined,
        MatchEvent::Cancelled,
        MatchEvent::Completed,
    ];

    #[test]
    fn test_first_message_starts_chatting() {
        let t = plan(MatchStatus::Matched, MatchEvent::MessageSent).unwrap();
        assert_eq!(t.to, MatchStatus::Chatting);
        assert!(t.cancel_rivals);
        assert!(!t.reveal);

        let t = plan(MatchStatus::VisitProposed, MatchEvent::MessageSent).unwrap();
        assert!(!t.changes_status());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in ALL.iter().filter(|s| s.is_terminal()) {
            for event in EVENTS {
                let err = plan(*status, event).unwrap_err();
                assert!(matches!(err, CoreError::InvalidTransition { .. }));
                assert!(err.is_client_error());
            }
        }
    }

    #[test]
    fn test_visit_proposal_sources() {
        for status in [
            MatchStatus::Matched,
            MatchStatus::Chatting,
            MatchStatus::VisitProposed,
        ] {
            let t = plan(status, MatchEvent::VisitProposed).unwrap();
            assert_eq!(t.to, MatchStatus::VisitProposed);
            assert!(t.cancel_rivals);
        }
        assert!(plan(MatchStatus::VisitConfirmed, MatchEvent::VisitProposed).is_err());
    }

    #[test]
    fn test_only_accepting_a_proposal_reveals() {
        for status in ALL {
            for event in EVENTS {
                if let Ok(t) = plan(status, event) {
                    let expected =
                        status == MatchStatus::VisitProposed && event == MatchEvent::VisitAccepted;
                    assert_eq!(t.reveal, expected, "{:?} on {:?}", event, status);
                }
            }
        }
        assert!(plan(MatchStatus::Chatting, MatchEvent::VisitAccepted).is_err());
    }

    #[test]
    fn test_decline_cancels_open_visit() {
        let t = plan(MatchStatus::VisitConfirmed, MatchEvent::Declined).unwrap();
        assert_eq!(t.to, MatchStatus::Declined);
        assert_eq!(t.visit, Some(VisitStatus::Cancelled));
        assert!(!t.cancel_rivals);
    }

    #[test]
    fn test_complete_requires_confirmed_visit() {
        let t = plan(MatchStatus::VisitConfirmed, MatchEvent::Completed).unwrap();
        assert_eq!(t.visit, Some(VisitStatus::Completed));
        assert!(plan(MatchStatus::VisitProposed, MatchEvent::Completed).is_err());
    }

    #[test]
    fn test_apply_rejects_stale_source_status() {
        let contractor = Contractor::new("Acme".to_string(), "Zwolle".to_string());
        let mut m = Match::new("u".to_string(), &contractor, "r".to_string());
        let t = plan(MatchStatus::VisitProposed, MatchEvent::VisitAccepted).unwrap();

        assert!(matches!(
            t.apply(&mut m, OffsetDateTime::now_utc()),
            Err(CoreError::StateConflict(_))
        ));
        assert_eq!(m.status, MatchStatus::Matched);
        assert!(!m.name_revealed);
    }

    #[test]
    fn test_reveal_is_monotonic_across_any_legal_sequence() {
        let contractor = Contractor::new("Acme".to_string(), "Zwolle".to_string());
        let mut m = Match::new("u".to_string(), &contractor, "r".to_string());
        let now = OffsetDateTime::now_utc();

        for event in [
            MatchEvent::MessageSent,
            MatchEvent::VisitProposed,
            MatchEvent::VisitAccepted,
        ] {
            plan(m.status, event).unwrap().apply(&mut m, now).unwrap();
        }
        assert!(m.name_revealed);
        let revealed_at = m.revealed_at;

        // Walk every remaining legal path from here; none may hide the name again.
        let mut frontier = vec![m];
        while let Some(current) = frontier.pop() {
            assert!(current.name_revealed);
            assert_eq!(current.revealed_at, revealed_at);
            for event in EVENTS {
                if let Ok(t) = plan(current.status, event) {
                    if !t.changes_status() {
                        continue;
                    }
                    let mut next = current.clone();
                    t.apply(&mut next, now + time::Duration::days(1)).unwrap();
                    frontier.push(next);
                }
            }
        }
    }
}
