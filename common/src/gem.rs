//! GemWallet browser-extension adapter.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::connector::Connector;
use crate::error::{ConnectorError, ProviderError, SdkError};
use crate::network::NetworkId;
use crate::provider::{AuthData, Provider, SigningRequest};
use crate::state::{ConnectorState, StateUpdate};
use crate::transaction::{Payment, Transaction};
use crate::wallet::WalletType;

/// Session events pushed by the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GemEvent {
    NetworkChanged(String),
    WalletChanged(String),
    Logout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GemPublicKey {
    pub address: String,
    pub public_key: String,
}

/// The subset of the GemWallet API the connector relies on.
///
/// Prompting calls return `Ok(None)` when the user declines.
#[async_trait(?Send)]
pub trait GemSdk {
    async fn is_installed(&self) -> bool;

    async fn get_address(&self) -> Result<Option<String>, SdkError>;

    /// Network display name, e.g. `"Testnet"`.
    async fn get_network(&self) -> Result<Option<String>, SdkError>;

    async fn get_public_key(&self) -> Result<Option<GemPublicKey>, SdkError>;

    /// Sign an arbitrary message, returning the hex signature.
    async fn sign_message(&self, message: &str) -> Result<Option<String>, SdkError>;

    /// Ask the user to sign and submit a transaction, returning its hash.
    async fn submit(&self, tx: &Transaction) -> Result<Option<String>, SdkError>;

    fn on_event(&self, listener: Box<dyn Fn(GemEvent)>);
}

type ProviderSlot<S> = Rc<RefCell<Option<Rc<GemProvider<S>>>>>;

pub struct GemConnector<S> {
    sdk: Rc<S>,
    state: ConnectorState,
    provider: ProviderSlot<S>,
}

impl<S: GemSdk + 'static> GemConnector<S> {
    pub fn new(sdk: S) -> Self {
        let sdk = Rc::new(sdk);
        let state = ConnectorState::new();
        let provider: ProviderSlot<S> = Rc::new(RefCell::new(None));

        let events_state = state.clone();
        let events_provider = Rc::clone(&provider);
        sdk.on_event(Box::new(move |event| {
            // Extension events only matter for a session we established.
            if events_provider.borrow().is_none() {
                return;
            }
            match event {
                GemEvent::NetworkChanged(name) => {
                    let network = NetworkId::from_name(&name);
                    tracing::info!(%network, "GemWallet network changed");
                    events_state.update(StateUpdate::network(network));
                }
                GemEvent::WalletChanged(address) => {
                    tracing::info!(%address, "GemWallet account changed");
                    events_state.update(StateUpdate::account(address));
                }
                GemEvent::Logout => {
                    tracing::info!("GemWallet logged out");
                    events_provider.borrow_mut().take();
                    events_state.reset();
                }
            }
        }));

        Self {
            sdk,
            state,
            provider,
        }
    }

    async fn open_session(&self) -> Result<(NetworkId, String), ConnectorError> {
        let address = self
            .sdk
            .get_address()
            .await?
            .ok_or(ConnectorError::UserRejected)?;
        let network = self
            .sdk
            .get_network()
            .await?
            .ok_or(ConnectorError::UserRejected)?;
        Ok((NetworkId::from_name(&network), address))
    }
}

#[async_trait(?Send)]
impl<S: GemSdk + 'static> Connector for GemConnector<S> {
    fn wallet_type(&self) -> WalletType {
        WalletType::Gem
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn provider(&self) -> Option<Rc<dyn Provider>> {
        self.provider
            .borrow()
            .clone()
            .map(|p| p as Rc<dyn Provider>)
    }

    async fn activate(&self) -> Result<(), ConnectorError> {
        if !self.sdk.is_installed().await {
            return Err(ConnectorError::NotInstalled);
        }

        let ticket = self.state.start_activation();
        match self.open_session().await {
            Ok((network, account)) => {
                if ticket.is_current() {
                    let provider = GemProvider {
                        sdk: Rc::clone(&self.sdk),
                    };
                    *self.provider.borrow_mut() = Some(Rc::new(provider));
                    tracing::info!(%network, %account, "GemWallet connected");
                }
                ticket.complete(StateUpdate::session(network, account));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "GemWallet activation failed");
                ticket.cancel();
                Err(err)
            }
        }
    }

    /// The extension remembers trusted sites, so reconnecting does not prompt.
    async fn connect_eagerly(&self) -> Result<bool, ConnectorError> {
        match self.activate().await {
            Ok(()) => Ok(self.state.is_active()),
            Err(ConnectorError::NotInstalled | ConnectorError::UserRejected) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn reset(&self) {
        self.provider.borrow_mut().take();
        self.state.reset();
    }
}

pub struct GemProvider<S> {
    sdk: Rc<S>,
}

impl<S: GemSdk + 'static> GemProvider<S> {
    /// The extension resolves the call itself once the user decides, so the
    /// whole SDK round trip becomes the `resolved` future.
    fn request(&self, tx: Transaction) -> SigningRequest {
        let sdk = Rc::clone(&self.sdk);
        SigningRequest::pending(None, async move {
            match sdk.submit(&tx).await {
                Ok(Some(hash)) => Some(hash),
                Ok(None) => {
                    tracing::info!("GemWallet request declined");
                    None
                }
                Err(err) => {
                    tracing::warn!(%err, "GemWallet request failed");
                    None
                }
            }
        })
    }
}

#[async_trait(?Send)]
impl<S: GemSdk + 'static> Provider for GemProvider<S> {
    async fn accept_offer(&self, offer_index: &str) -> Result<SigningRequest, ProviderError> {
        Ok(self.request(Transaction::accept_offer(offer_index)))
    }

    async fn set_account(&self, minter: &str) -> Result<SigningRequest, ProviderError> {
        Ok(self.request(Transaction::authorize_minter(minter)))
    }

    async fn send_payment(&self, payment: &Payment) -> Result<SigningRequest, ProviderError> {
        Ok(self.request(Transaction::payment(payment)))
    }

    async fn get_auth_data(&self, challenge: &str) -> Result<AuthData, ProviderError> {
        let key = self
            .sdk
            .get_public_key()
            .await?
            .ok_or(ProviderError::Rejected)?;
        let signature = self
            .sdk
            .sign_message(challenge)
            .await?
            .ok_or(ProviderError::Rejected)?;
        Ok(AuthData::Gem {
            public_key: key.public_key,
            signature,
        })
    }
}
