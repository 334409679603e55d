//! REST client for the POAP platform backend.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::AuthSession;
pub use client::ApiClient;
pub use error::{ApiError, AuthError};
