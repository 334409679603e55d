//! Wallet connectors and the claim / event-setup workflows of the POAP
//! platform, shared by the browser front end and the API client.

pub mod backend;
pub mod claim;
pub mod config;
pub mod connector;
pub mod error;
pub mod event;
pub mod event_setup;
pub mod gem;
pub mod mock;
pub mod network;
pub mod provider;
pub mod registry;
pub mod scope;
pub mod session;
pub mod state;
pub mod transaction;
pub mod wallet;
pub mod workflow;
pub mod xumm;

pub use connector::Connector;
pub use error::{BackendError, ConnectorError, ProviderError, SdkError};
pub use network::NetworkId;
pub use provider::{Provider, SigningRequest};
pub use registry::ConnectorRegistry;
pub use state::{ConnectorState, StateSnapshot};
pub use wallet::WalletType;
