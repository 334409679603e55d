use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::NetworkId;
use crate::transaction::Payment;

/// Server-side lifecycle of an event. Ordered: later variants are further
/// along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Registered, deposit not yet received.
    Pending,
    /// Deposit verified, NFTs being minted.
    Paid,
    /// Open for attendees to join and claim.
    Active,
    Closed,
    Canceled,
}

impl EventStatus {
    /// Whether the deposit for the event has been received.
    pub fn is_funded(self) -> bool {
        matches!(self, EventStatus::Paid | EventStatus::Active | EventStatus::Closed)
    }

    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Pending => "Awaiting deposit",
            EventStatus::Paid => "Minting",
            EventStatus::Active => "Active",
            EventStatus::Closed => "Closed",
            EventStatus::Canceled => "Canceled",
        }
    }
}

/// What an organizer submits to register an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub network_id: NetworkId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub token_count: u32,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub is_managed: bool,
}

impl EventDraft {
    /// Validate the draft before it is sent. Returns a user-facing message.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".into());
        }
        if self.token_count == 0 {
            return Err("At least one token is required".into());
        }
        if self.date_end < self.date_start {
            return Err("Event must end after it starts".into());
        }
        if self.network_id == NetworkId::Unknown {
            return Err("Unsupported network".into());
        }
        Ok(())
    }
}

/// Response to a successful registration: the event plus the deposit the
/// organizer has to pay before NFTs are minted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub event_id: u32,
    pub status: EventStatus,
    pub deposit: Payment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub id: u32,
    pub status: EventStatus,
    pub network_id: NetworkId,
    pub owner: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub image_url: Option<String>,
    pub token_count: u32,
    pub date_start: DateTime<Utc>,
    pub date_end: DateTime<Utc>,
    pub is_managed: bool,
    #[serde(default)]
    pub attendees: u32,
}

/// NFT sell offer reserved for an attendee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub event_id: u32,
    pub owner: String,
    /// Ledger index of the sell offer. `None` while minting is in progress.
    pub offer_index: Option<String>,
    pub claimed: bool,
}

/// Addresses the platform operates with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    /// Account that mints NFTs on behalf of organizers.
    pub minter: String,
    /// Account receiving event deposits.
    pub vault: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub users: u64,
    pub organizers: u64,
    pub events: EventCounts,
    pub claimed_nfts: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCounts {
    pub pending: u64,
    pub active: u64,
    pub closed: u64,
    pub canceled: u64,
}

impl EventCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.active + self.closed + self.canceled
    }
}
