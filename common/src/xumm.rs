//! Xumm adapter.
//!
//! Sessions come from the OAuth2 PKCE flow: either a fresh authorization
//! (pop-up or app hand-off) or a session restored from browser storage. Each
//! signing request becomes a Xumm payload identified by a uuid; the user signs
//! it in the mobile app and the payload outcome resolves the request.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::connector::Connector;
use crate::error::{ConnectorError, ProviderError, SdkError};
use crate::network::NetworkId;
use crate::provider::{AuthData, Provider, SigningRequest};
use crate::state::{ActivationTicket, ConnectorState, StateUpdate};
use crate::transaction::{Payment, Transaction};
use crate::wallet::WalletType;

/// An authorized Xumm session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XummSession {
    pub account: String,
    /// `networkType` as reported by Xumm, e.g. `"TESTNET"`.
    pub network: String,
    /// `networkEndpoint`, used when the network type is missing or unknown.
    pub endpoint: Option<String>,
    pub jwt: String,
}

impl XummSession {
    pub fn network_id(&self) -> NetworkId {
        match NetworkId::from_name(&self.network) {
            NetworkId::Unknown => self
                .endpoint
                .as_deref()
                .map_or(NetworkId::Unknown, NetworkId::from_endpoint),
            known => known,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XummEvent {
    /// A session was restored from storage.
    Retrieved(XummSession),
    /// The user completed a fresh authorization.
    Success(XummSession),
    LoggedOut,
}

/// Final state of a signing payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayloadOutcome {
    Signed { txid: String },
    Rejected,
    Expired,
}

/// The subset of the Xumm SDK the connector relies on.
#[async_trait(?Send)]
pub trait XummSdk {
    /// Run the PKCE authorization. `Ok(None)` when the user closed it.
    async fn authorize(&self) -> Result<Option<XummSession>, SdkError>;

    /// Session persisted by an earlier authorization, if any.
    async fn restore(&self) -> Result<Option<XummSession>, SdkError>;

    async fn logout(&self) -> Result<(), SdkError>;

    /// Create a signing payload and return its uuid.
    async fn create_payload(&self, tx: &Transaction) -> Result<String, SdkError>;

    /// Wait until the payload is signed, rejected or expired. Keeps waiting
    /// across an app hand-off.
    async fn payload_outcome(&self, uuid: &str) -> Result<PayloadOutcome, SdkError>;

    fn on_event(&self, listener: Box<dyn Fn(XummEvent)>);
}

/// How the in-flight activation was started. `Success` events answer an
/// authorization, `Retrieved` events a restore.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    Authorize,
    Restore,
}

type ProviderSlot<S> = Rc<RefCell<Option<Rc<XummProvider<S>>>>>;
type AttemptSlot = Rc<RefCell<Option<(Attempt, ActivationTicket)>>>;

/// Xumm connector. Session events from the SDK are only honored while the
/// matching activation is in flight; a session event nobody asked for, or one
/// arriving after a reset, is dropped.
pub struct XummConnector<S> {
    sdk: Rc<S>,
    state: ConnectorState,
    provider: ProviderSlot<S>,
    attempt: AttemptSlot,
}

fn install<S>(sdk: &Rc<S>, slot: &ProviderSlot<S>, session: &XummSession) -> StateUpdate {
    let provider = XummProvider {
        sdk: Rc::clone(sdk),
        jwt: session.jwt.clone(),
    };
    *slot.borrow_mut() = Some(Rc::new(provider));
    StateUpdate::session(session.network_id(), session.account.clone())
}

/// Complete `ticket` with `session`, installing a provider only if the
/// activation is still current.
fn settle<S>(
    sdk: &Rc<S>,
    provider: &ProviderSlot<S>,
    ticket: ActivationTicket,
    session: &XummSession,
) -> bool {
    if ticket.is_current() {
        let update = install(sdk, provider, session);
        ticket.complete(update)
    } else {
        ticket.complete(StateUpdate::default())
    }
}

/// Take the in-flight ticket if it was started as `attempt` at `started_at`.
fn take_attempt(
    slot: &AttemptSlot,
    attempt: Attempt,
    started_at: Option<u64>,
) -> Option<ActivationTicket> {
    let mut slot = slot.borrow_mut();
    let matches = slot.as_ref().is_some_and(|(kind, ticket)| {
        *kind == attempt && started_at.map_or(true, |v| ticket.started_at() == v)
    });
    if matches {
        slot.take().map(|(_, ticket)| ticket)
    } else {
        None
    }
}

impl<S: XummSdk + 'static> XummConnector<S> {
    pub fn new(sdk: S) -> Self {
        let sdk = Rc::new(sdk);
        let state = ConnectorState::new();
        let provider: ProviderSlot<S> = Rc::new(RefCell::new(None));
        let attempt: AttemptSlot = Rc::new(RefCell::new(None));

        let events_sdk = Rc::downgrade(&sdk);
        let events_state = state.clone();
        let events_provider = Rc::clone(&provider);
        let events_attempt = Rc::clone(&attempt);
        sdk.on_event(Box::new(move |event| {
            let (kind, session) = match event {
                XummEvent::Retrieved(session) => (Attempt::Restore, session),
                XummEvent::Success(session) => (Attempt::Authorize, session),
                XummEvent::LoggedOut => {
                    tracing::info!("Xumm logged out");
                    events_provider.borrow_mut().take();
                    events_state.reset();
                    drop(events_attempt.borrow_mut().take());
                    return;
                }
            };
            let Some(ticket) = take_attempt(&events_attempt, kind, None) else {
                tracing::debug!(?kind, account = %session.account, "ignoring unrequested Xumm session");
                return;
            };
            let Some(sdk) = events_sdk.upgrade() else {
                return;
            };
            if settle(&sdk, &events_provider, ticket, &session) {
                tracing::info!(account = %session.account, "Xumm session available");
            }
        }));

        Self {
            sdk,
            state,
            provider,
            attempt,
        }
    }

    fn begin(&self, kind: Attempt) -> u64 {
        let ticket = self.state.start_activation();
        let started_at = ticket.started_at();
        // A replaced ticket is already stale; dropping it rolls nothing back.
        let replaced = self.attempt.borrow_mut().replace((kind, ticket));
        drop(replaced);
        started_at
    }

    /// Settle an attempt with the SDK's answer. Returns `false` when the
    /// attempt had already been settled by an event or superseded.
    fn finish(&self, kind: Attempt, started_at: u64, session: Option<&XummSession>) -> bool {
        let Some(ticket) = take_attempt(&self.attempt, kind, Some(started_at)) else {
            return false;
        };
        match session {
            Some(session) => settle(&self.sdk, &self.provider, ticket, session),
            None => {
                ticket.cancel();
                false
            }
        }
    }
}

#[async_trait(?Send)]
impl<S: XummSdk + 'static> Connector for XummConnector<S> {
    fn wallet_type(&self) -> WalletType {
        WalletType::Xumm
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
        let started_at = self.begin(Attempt::Authorize);
        match self.sdk.authorize().await {
            Ok(Some(session)) => {
                self.finish(Attempt::Authorize, started_at, Some(&session));
                Ok(())
            }
            Ok(None) => {
                self.finish(Attempt::Authorize, started_at, None);
                Err(ConnectorError::UserRejected)
            }
            Err(err) => {
                tracing::warn!(%err, "Xumm authorization failed");
                self.finish(Attempt::Authorize, started_at, None);
                Err(err.into())
            }
        }
    }

    async fn connect_eagerly(&self) -> Result<bool, ConnectorError> {
        let started_at = self.begin(Attempt::Restore);
        match self.sdk.restore().await {
            Ok(Some(session)) => {
                self.finish(Attempt::Restore, started_at, Some(&session));
                Ok(self.state.is_active())
            }
            Ok(None) => {
                self.finish(Attempt::Restore, started_at, None);
                Ok(false)
            }
            Err(err) => {
                self.finish(Attempt::Restore, started_at, None);
                Err(err.into())
            }
        }
    }

    async fn deactivate(&self) -> Result<(), ConnectorError> {
        if let Err(err) = self.sdk.logout().await {
            tracing::warn!(%err, "Xumm logout failed, clearing local session anyway");
        }
        self.reset();
        Ok(())
    }

    fn reset(&self) {
        self.provider.borrow_mut().take();
        self.state.reset();
        let abandoned = self.attempt.borrow_mut().take();
        drop(abandoned);
    }
}

pub struct XummProvider<S> {
    sdk: Rc<S>,
    jwt: String,
}

impl<S: XummSdk + 'static> XummProvider<S> {
    async fn request(&self, tx: Transaction) -> Result<SigningRequest, ProviderError> {
        let uuid = self.sdk.create_payload(&tx).await?;
        let sdk = Rc::clone(&self.sdk);
        let payload = uuid.clone();
        Ok(SigningRequest::pending(Some(uuid), async move {
            match sdk.payload_outcome(&payload).await {
                Ok(PayloadOutcome::Signed { txid }) => Some(txid),
                Ok(outcome) => {
                    tracing::info!(%payload, ?outcome, "Xumm payload not signed");
                    None
                }
                Err(err) => {
                    tracing::warn!(%payload, %err, "Xumm payload subscription failed");
                    None
                }
            }
        }))
    }
}

#[async_trait(?Send)]
impl<S: XummSdk + 'static> Provider for XummProvider<S> {
    async fn accept_offer(&self, offer_index: &str) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::accept_offer(offer_index)).await
    }

    async fn set_account(&self, minter: &str) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::authorize_minter(minter)).await
    }

    async fn send_payment(&self, payment: &Payment) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::payment(payment)).await
    }

    /// Xumm already proved account ownership during authorization; the JWT
    /// stands in for a challenge signature.
    async fn get_auth_data(&self, _challenge: &str) -> Result<AuthData, ProviderError> {
        Ok(AuthData::Xumm {
            jwt: self.jwt.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::channel::oneshot;

    use super::*;
    use crate::mock::MockXummSdk;

    fn session(account: &str) -> XummSession {
        XummSession {
            account: account.into(),
            network: "TESTNET".into(),
            endpoint: None,
            jwt: format!("jwt-{account}"),
        }
    }

    #[tokio::test]
    async fn authorize_establishes_session() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(Some(session("rA1"))));
        let xumm = XummConnector::new(sdk);

        xumm.activate().await.unwrap();
        assert!(xumm.state().is_active());
        assert_eq!(xumm.state().network_id(), Some(NetworkId::Testnet));
        let auth = xumm.provider().unwrap().get_auth_data("ignored").await.unwrap();
        assert_eq!(auth, AuthData::Xumm { jwt: "jwt-rA1".into() });
    }

    #[tokio::test]
    async fn closed_popup_is_rejection() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(None));
        let xumm = XummConnector::new(sdk);
        let before = xumm.state().snapshot();

        assert_eq!(xumm.activate().await, Err(ConnectorError::UserRejected));
        assert_eq!(xumm.state().snapshot(), before);
    }

    #[tokio::test]
    async fn restore_without_session() {
        let xumm = XummConnector::new(MockXummSdk::new());
        assert!(!xumm.connect_eagerly().await.unwrap());
        assert!(!xumm.state().activating());
    }

    #[tokio::test]
    async fn restored_session_connects() {
        let sdk = MockXummSdk::new();
        sdk.set_restored(Some(session("rStored")));
        let xumm = XummConnector::new(sdk);
        assert!(xumm.connect_eagerly().await.unwrap());
        assert_eq!(xumm.state().account().as_deref(), Some("rStored"));
    }

    #[tokio::test]
    async fn unrequested_session_events_are_ignored() {
        let sdk = MockXummSdk::new();
        let xumm = XummConnector::new(sdk.clone());

        sdk.emit(XummEvent::Retrieved(session("rA1")));
        sdk.emit(XummEvent::Success(session("rB2")));
        assert!(!xumm.state().is_active());
        assert!(xumm.provider().is_none());
    }

    #[tokio::test]
    async fn logout_event_ends_session() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(Some(session("rA1"))));
        let xumm = XummConnector::new(sdk.clone());
        xumm.activate().await.unwrap();

        sdk.emit(XummEvent::LoggedOut);
        assert!(!xumm.state().is_active());
        assert!(xumm.provider().is_none());
    }

    #[tokio::test]
    async fn reset_while_authorizing_drops_late_session() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(Some(session("rLate"))));
        let (release, gate) = oneshot::channel();
        sdk.hold_authorization_until(gate);
        let xumm = XummConnector::new(sdk.clone());

        let (result, ()) = futures::join!(xumm.activate(), async {
            xumm.reset();
            let _ = release.send(());
        });

        assert_eq!(result, Ok(()));
        assert!(!xumm.state().is_active());
        assert_eq!(xumm.state().account(), None);
        assert!(xumm.provider().is_none());
    }

    #[tokio::test]
    async fn restore_event_does_not_answer_authorization() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(None));
        let (release, gate) = oneshot::channel();
        sdk.hold_authorization_until(gate);
        let xumm = XummConnector::new(sdk.clone());

        let (result, ()) = futures::join!(xumm.activate(), async {
            sdk.emit(XummEvent::Retrieved(session("rOther")));
            let _ = release.send(());
        });

        assert_eq!(result, Err(ConnectorError::UserRejected));
        assert!(!xumm.state().is_active());
        assert!(xumm.provider().is_none());
    }

    #[test]
    fn endpoint_fills_in_unknown_network() {
        let mut restored = session("rA1");
        restored.network = String::new();
        restored.endpoint = Some("wss://s.altnet.rippletest.net:51233".into());
        assert_eq!(restored.network_id(), NetworkId::Testnet);

        restored.network = "MAINNET".into();
        assert_eq!(restored.network_id(), NetworkId::Mainnet);
    }

    #[tokio::test]
    async fn deactivate_logs_out() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(Some(session("rA1"))));
        let xumm = XummConnector::new(sdk.clone());
        xumm.activate().await.unwrap();

        xumm.deactivate().await.unwrap();
        xumm.deactivate().await.unwrap();
        assert!(!xumm.state().is_active());
        assert_eq!(sdk.logouts(), 2);
    }

    #[tokio::test]
    async fn payloads_carry_uuid() {
        let sdk = MockXummSdk::new();
        sdk.set_authorization(Ok(Some(session("rA1"))));
        sdk.push_outcome(PayloadOutcome::Signed { txid: "TX1".into() });
        sdk.push_outcome(PayloadOutcome::Expired);
        let xumm = XummConnector::new(sdk.clone());
        xumm.activate().await.unwrap();
        let provider = xumm.provider().unwrap();

        let signed = provider
            .send_payment(&Payment::new("rVault", 1_000_000))
            .await
            .unwrap();
        assert_eq!(signed.uuid.as_deref(), Some("payload-1"));
        assert_eq!(signed.wait().await.as_deref(), Some("TX1"));

        let expired = provider.accept_offer("OFFER").await.unwrap();
        assert_eq!(expired.uuid.as_deref(), Some("payload-2"));
        assert_eq!(expired.wait().await, None);
    }
}
