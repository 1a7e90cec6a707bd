//! Caller identity from request headers
//!
//! An upstream session layer is expected to set these after authenticating
//! the user.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use reno_core::{Caller, Role};

use crate::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub struct CurrentCaller(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let (Some(user_id), Some(role)) = (header(USER_ID_HEADER), header(USER_ROLE_HEADER))
        else {
            return Err(ApiError::Unauthorized);
        };
        let role: Role = role.parse().map_err(|_| ApiError::Unauthorized)?;

        Ok(Self(Caller::new(user_id, role)))
    }
}
