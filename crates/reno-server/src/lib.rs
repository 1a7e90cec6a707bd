//! HTTP API for the marketplace

pub mod error;
pub mod extract;
pub mod server;

pub use error::ApiError;
pub use extract::{CurrentCaller, USER_ID_HEADER, USER_ROLE_HEADER};
pub use server::{ApiServer, router};
