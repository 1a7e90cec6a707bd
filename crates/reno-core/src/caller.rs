//! Authenticated caller identity and role-specific ownership checks

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Author, CoreError, Match, RenovationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Consumer,
    Contractor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumer => "CONSUMER",
            Self::Contractor => "CONTRACTOR",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONSUMER" => Ok(Self::Consumer),
            "CONTRACTOR" => Ok(Self::Contractor),
            other => Err(CoreError::validation(format!("Unknown role: {}", other))),
        }
    }
}

/// Account record; only the name matters to this core (it is disclosed
/// after the reveal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn new(name: String, email: String, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            role,
        }
    }
}

/// The party making a request, as resolved by the session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Consumer { user_id: String },
    Contractor { user_id: String },
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        let user_id = user_id.into();
        match role {
            Role::Consumer => Self::Consumer { user_id },
            Role::Contractor => Self::Contractor { user_id },
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Consumer { user_id } | Self::Contractor { user_id } => user_id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Consumer { .. } => Role::Consumer,
            Self::Contractor { .. } => Role::Contractor,
        }
    }

    /// Consumers own the request behind the match; contractors own the
    /// contractor profile linked to it.
    pub fn participates_in(&self, m: &Match) -> bool {
        match self {
            Self::Consumer { user_id } => m.consumer_id == *user_id,
            Self::Contractor { user_id } => m.contractor_user_id.as_deref() == Some(user_id.as_str()),
        }
    }

    pub fn owns_request(&self, request: &RenovationRequest) -> bool {
        match self {
            Self::Consumer { user_id } => request.consumer_id == *user_id,
            Self::Contractor { .. } => false,
        }
    }

    /// Author identity for a message this caller writes into `m`.
    pub fn author_in(&self, m: &Match) -> Author {
        match self {
            Self::Consumer { user_id } => Author::Consumer(user_id.clone()),
            Self::Contractor { .. } => Author::Contractor(m.contractor_id.clone()),
        }
    }
}
