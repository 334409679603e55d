//! Backend operations the workflows depend on.
//!
//! Implemented over HTTP by `poap-api`; tests substitute the mocks in
//! [`crate::mock`].

use async_trait::async_trait;

use crate::error::BackendError;
use crate::event::{CreatedEvent, EventDraft, EventStatus, Offer, PlatformInfo};

#[async_trait(?Send)]
pub trait ClaimBackend {
    /// Join the event and return the NFT offer reserved for `account`.
    async fn request_offer(&self, event_id: u32, account: &str) -> Result<Offer, BackendError>;

    /// The offer `account` already holds for the event, if any.
    async fn claim_status(&self, event_id: u32, account: &str)
        -> Result<Option<Offer>, BackendError>;
}

#[async_trait(?Send)]
pub trait EventBackend {
    async fn platform_info(&self) -> Result<PlatformInfo, BackendError>;

    /// Whether the platform minter may mint on behalf of `account`.
    async fn minter_authorized(&self, account: &str) -> Result<bool, BackendError>;

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent, BackendError>;

    /// Check a deposit transaction and return the event's resulting status.
    async fn verify_payment(&self, event_id: u32, tx_hash: &str)
        -> Result<EventStatus, BackendError>;
}
