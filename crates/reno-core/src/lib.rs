//! Core domain models and logic for reno
//!
//! This crate contains:
//! - Domain models (Match, Message, Visit, Contractor, RenovationRequest)
//! - Caller identity and ownership checks
//! - Match lifecycle state machine, disclosure policy, contractor labels
//! - Chat rate limiting
//! - The storage trait the engine runs against

pub mod caller;
pub mod disclosure;
pub mod error;
pub mod label;
pub mod lifecycle;
pub mod matching;
pub mod message;
pub mod rate_limit;
pub mod store;
pub mod visit;

pub use caller::{Caller, Role, User};
pub use error::{CoreError, Result};
pub use label::{contractor_label, label_for};
pub use lifecycle::{MatchEvent, Transition, plan};
pub use matching::{Contractor, ContractorProfile, Match, MatchStatus, RenovationRequest};
pub use message::{Author, Message};
pub use rate_limit::MessageRateLimiter;
pub use store::MarketStore;
pub use visit::{Visit, VisitStatus};
