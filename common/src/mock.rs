//! In-memory stand-ins for the wallet SDKs, a connected provider and the
//! backend.
//!
//! Nothing here talks to a wallet or the network; every prompt resolves
//! immediately with whatever outcome was configured. Used by the tests and for
//! exercising the workflows without a browser.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::backend::{ClaimBackend, EventBackend};
use crate::error::{BackendError, ProviderError, SdkError};
use crate::event::{CreatedEvent, EventDraft, EventStatus, Offer, PlatformInfo};
use crate::gem::{GemEvent, GemPublicKey, GemSdk};
use crate::provider::{AuthData, Provider, SigningRequest};
use crate::transaction::{Payment, Transaction, DROPS_PER_XRP};
use crate::xumm::{PayloadOutcome, XummEvent, XummSdk, XummSession};

// ─── GemWallet ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct GemInner {
    installed: Cell<bool>,
    address: RefCell<Option<String>>,
    network: RefCell<Option<String>>,
    failure: RefCell<Option<SdkError>>,
    address_gate: RefCell<Option<oneshot::Receiver<()>>>,
    tx_results: RefCell<VecDeque<Option<String>>>,
    submitted: RefCell<Vec<Transaction>>,
    listeners: RefCell<Vec<Box<dyn Fn(GemEvent)>>>,
}

/// Scriptable GemWallet extension. Clones share state.
#[derive(Clone, Default)]
pub struct MockGemSdk {
    inner: Rc<GemInner>,
}

impl MockGemSdk {
    /// An installed extension that approves the connection.
    pub fn connected(network: &str, address: &str) -> Self {
        let sdk = Self::default();
        sdk.inner.installed.set(true);
        *sdk.inner.address.borrow_mut() = Some(address.to_string());
        *sdk.inner.network.borrow_mut() = Some(network.to_string());
        sdk
    }

    pub fn set_installed(&self, installed: bool) {
        self.inner.installed.set(installed);
    }

    /// `None` makes the address prompt behave as declined.
    pub fn set_address(&self, address: Option<&str>) {
        *self.inner.address.borrow_mut() = address.map(String::from);
    }

    pub fn fail_with(&self, err: SdkError) {
        *self.inner.failure.borrow_mut() = Some(err);
    }

    /// Block the address prompt until `gate` fires.
    pub fn hold_address_until(&self, gate: oneshot::Receiver<()>) {
        *self.inner.address_gate.borrow_mut() = Some(gate);
    }

    /// Queue the outcome of the next submitted transaction.
    pub fn push_tx_result(&self, hash: Option<String>) {
        self.inner.tx_results.borrow_mut().push_back(hash);
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.inner.submitted.borrow().clone()
    }

    pub fn emit(&self, event: GemEvent) {
        for listener in self.inner.listeners.borrow().iter() {
            listener(event.clone());
        }
    }
}

#[async_trait(?Send)]
impl GemSdk for MockGemSdk {
    async fn is_installed(&self) -> bool {
        self.inner.installed.get()
    }

    async fn get_address(&self) -> Result<Option<String>, SdkError> {
        let gate = self.inner.address_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = self.inner.failure.borrow().clone() {
            return Err(err);
        }
        Ok(self.inner.address.borrow().clone())
    }

    async fn get_network(&self) -> Result<Option<String>, SdkError> {
        Ok(self.inner.network.borrow().clone())
    }

    async fn get_public_key(&self) -> Result<Option<GemPublicKey>, SdkError> {
        Ok(self.inner.address.borrow().clone().map(|address| GemPublicKey {
            public_key: format!("ED-{address}"),
            address,
        }))
    }

    async fn sign_message(&self, message: &str) -> Result<Option<String>, SdkError> {
        Ok(Some(format!("signed:{message}")))
    }

    async fn submit(&self, tx: &Transaction) -> Result<Option<String>, SdkError> {
        self.inner.submitted.borrow_mut().push(tx.clone());
        Ok(self.inner.tx_results.borrow_mut().pop_front().flatten())
    }

    fn on_event(&self, listener: Box<dyn Fn(GemEvent)>) {
        self.inner.listeners.borrow_mut().push(listener);
    }
}

// ─── Xumm ────────────────────────────────────────────────────────────────────

struct XummInner {
    authorization: RefCell<Result<Option<XummSession>, SdkError>>,
    authorization_gate: RefCell<Option<oneshot::Receiver<()>>>,
    restored: RefCell<Option<XummSession>>,
    logouts: Cell<u32>,
    payloads: Cell<u32>,
    outcomes: RefCell<VecDeque<PayloadOutcome>>,
    created: RefCell<Vec<Transaction>>,
    listeners: RefCell<Vec<Box<dyn Fn(XummEvent)>>>,
}

/// Scriptable Xumm SDK. Clones share state.
#[derive(Clone)]
pub struct MockXummSdk {
    inner: Rc<XummInner>,
}

impl Default for MockXummSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockXummSdk {
    /// No stored session; authorization is closed by the user.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(XummInner {
                authorization: RefCell::new(Ok(None)),
                authorization_gate: RefCell::new(None),
                restored: RefCell::new(None),
                logouts: Cell::new(0),
                payloads: Cell::new(0),
                outcomes: RefCell::new(VecDeque::new()),
                created: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn set_authorization(&self, result: Result<Option<XummSession>, SdkError>) {
        *self.inner.authorization.borrow_mut() = result;
    }

    /// Block the authorization until `gate` fires.
    pub fn hold_authorization_until(&self, gate: oneshot::Receiver<()>) {
        *self.inner.authorization_gate.borrow_mut() = Some(gate);
    }

    pub fn set_restored(&self, session: Option<XummSession>) {
        *self.inner.restored.borrow_mut() = session;
    }

    /// Queue the outcome of the next payload. Unscripted payloads expire.
    pub fn push_outcome(&self, outcome: PayloadOutcome) {
        self.inner.outcomes.borrow_mut().push_back(outcome);
    }

    pub fn logouts(&self) -> u32 {
        self.inner.logouts.get()
    }

    pub fn created(&self) -> Vec<Transaction> {
        self.inner.created.borrow().clone()
    }

    pub fn emit(&self, event: XummEvent) {
        for listener in self.inner.listeners.borrow().iter() {
            listener(event.clone());
        }
    }
}

#[async_trait(?Send)]
impl XummSdk for MockXummSdk {
    /// Like the SDK, announces a granted session with `Success` before
    /// resolving.
    async fn authorize(&self) -> Result<Option<XummSession>, SdkError> {
        let gate = self.inner.authorization_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let result = self.inner.authorization.borrow().clone();
        if let Ok(Some(session)) = &result {
            self.emit(XummEvent::Success(session.clone()));
        }
        result
    }

    async fn restore(&self) -> Result<Option<XummSession>, SdkError> {
        let restored = self.inner.restored.borrow().clone();
        if let Some(session) = &restored {
            self.emit(XummEvent::Retrieved(session.clone()));
        }
        Ok(restored)
    }

    async fn logout(&self) -> Result<(), SdkError> {
        self.inner.logouts.set(self.inner.logouts.get() + 1);
        Ok(())
    }

    async fn create_payload(&self, tx: &Transaction) -> Result<String, SdkError> {
        let n = self.inner.payloads.get() + 1;
        self.inner.payloads.set(n);
        self.inner.created.borrow_mut().push(tx.clone());
        Ok(format!("payload-{n}"))
    }

    async fn payload_outcome(&self, _uuid: &str) -> Result<PayloadOutcome, SdkError> {
        Ok(self
            .inner
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(PayloadOutcome::Expired))
    }

    fn on_event(&self, listener: Box<dyn Fn(XummEvent)>) {
        self.inner.listeners.borrow_mut().push(listener);
    }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// Provider whose requests resolve immediately.
#[derive(Default)]
pub struct MockProvider {
    default: RefCell<Option<String>>,
    queue: RefCell<VecDeque<Option<String>>>,
    failure: RefCell<Option<ProviderError>>,
    signed: RefCell<Vec<Transaction>>,
}

impl MockProvider {
    /// Every request resolves to `hash` unless a resolution was queued.
    pub fn resolving(hash: Option<&str>) -> Self {
        let provider = Self::default();
        *provider.default.borrow_mut() = hash.map(String::from);
        provider
    }

    pub fn push_resolution(&self, hash: Option<&str>) {
        self.queue.borrow_mut().push_back(hash.map(String::from));
    }

    pub fn fail_with(&self, err: ProviderError) {
        *self.failure.borrow_mut() = Some(err);
    }

    /// Every transaction submitted so far, in order.
    pub fn signed(&self) -> Vec<Transaction> {
        self.signed.borrow().clone()
    }

    pub fn accepted_offers(&self) -> Vec<String> {
        self.signed
            .borrow()
            .iter()
            .filter_map(|tx| match tx {
                Transaction::NFTokenAcceptOffer { sell_offer } => Some(sell_offer.clone()),
                _ => None,
            })
            .collect()
    }

    fn request(&self, tx: Transaction) -> Result<SigningRequest, ProviderError> {
        if let Some(err) = self.failure.borrow().clone() {
            return Err(err);
        }
        self.signed.borrow_mut().push(tx);
        let hash = self
            .queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.default.borrow().clone());
        Ok(SigningRequest::ready(hash))
    }
}

#[async_trait(?Send)]
impl Provider for MockProvider {
    async fn accept_offer(&self, offer_index: &str) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::accept_offer(offer_index))
    }

    async fn set_account(&self, minter: &str) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::authorize_minter(minter))
    }

    async fn send_payment(&self, payment: &Payment) -> Result<SigningRequest, ProviderError> {
        self.request(Transaction::payment(payment))
    }

    async fn get_auth_data(&self, _challenge: &str) -> Result<AuthData, ProviderError> {
        Ok(AuthData::Xumm {
            jwt: "mock-jwt".into(),
        })
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Claim backend holding offers per `(event, account)`.
#[derive(Default)]
pub struct MockClaimBackend {
    offers: RefCell<HashMap<(u32, String), Offer>>,
    failure: RefCell<Option<String>>,
}

impl MockClaimBackend {
    pub fn with_offer(event_id: u32, account: &str, offer_index: &str) -> Self {
        let backend = Self::default();
        backend.insert(event_id, account, Some(offer_index.to_string()));
        backend
    }

    /// An offer whose NFT is not minted yet.
    pub fn insert_minting(&self, event_id: u32, account: &str) {
        self.insert(event_id, account, None);
    }

    pub fn mark_claimed(&self, event_id: u32, account: &str) {
        if let Some(offer) = self
            .offers
            .borrow_mut()
            .get_mut(&(event_id, account.to_string()))
        {
            offer.claimed = true;
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_string());
    }

    fn insert(&self, event_id: u32, account: &str, offer_index: Option<String>) {
        self.offers.borrow_mut().insert(
            (event_id, account.to_string()),
            Offer {
                event_id,
                owner: account.to_string(),
                offer_index,
                claimed: false,
            },
        );
    }

    fn check(&self) -> Result<(), BackendError> {
        match self.failure.borrow().as_ref() {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl ClaimBackend for MockClaimBackend {
    async fn request_offer(&self, event_id: u32, account: &str) -> Result<Offer, BackendError> {
        self.check()?;
        self.offers
            .borrow()
            .get(&(event_id, account.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::new("No NFT left for this event"))
    }

    async fn claim_status(
        &self,
        event_id: u32,
        account: &str,
    ) -> Result<Option<Offer>, BackendError> {
        self.check()?;
        Ok(self
            .offers
            .borrow()
            .get(&(event_id, account.to_string()))
            .cloned())
    }
}

/// Deposit charged per token by [`MockEventBackend`].
pub const MOCK_DEPOSIT_PER_TOKEN: u64 = DROPS_PER_XRP / 2;

/// Event backend with a fixed minter and vault (`rMinter`, `rVault`).
pub struct MockEventBackend {
    platform: PlatformInfo,
    authorized: Cell<bool>,
    verification: Cell<EventStatus>,
    next_id: Cell<u32>,
    verified: RefCell<Vec<(u32, String)>>,
}

impl Default for MockEventBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventBackend {
    pub fn new() -> Self {
        Self {
            platform: PlatformInfo {
                minter: "rMinter".into(),
                vault: "rVault".into(),
            },
            authorized: Cell::new(false),
            verification: Cell::new(EventStatus::Paid),
            next_id: Cell::new(1),
            verified: RefCell::new(Vec::new()),
        }
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.set(authorized);
    }

    /// Status returned by the next payment verifications.
    pub fn set_verification_status(&self, status: EventStatus) {
        self.verification.set(status);
    }

    pub fn verified(&self) -> Vec<(u32, String)> {
        self.verified.borrow().clone()
    }
}

#[async_trait(?Send)]
impl EventBackend for MockEventBackend {
    async fn platform_info(&self) -> Result<PlatformInfo, BackendError> {
        Ok(self.platform.clone())
    }

    async fn minter_authorized(&self, _account: &str) -> Result<bool, BackendError> {
        Ok(self.authorized.get())
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent, BackendError> {
        let event_id = self.next_id.get();
        self.next_id.set(event_id + 1);
        let amount = u64::from(draft.token_count) * MOCK_DEPOSIT_PER_TOKEN;
        Ok(CreatedEvent {
            event_id,
            status: EventStatus::Pending,
            deposit: Payment::new(self.platform.vault.clone(), amount)
                .with_memo(event_id.to_string()),
        })
    }

    async fn verify_payment(
        &self,
        event_id: u32,
        tx_hash: &str,
    ) -> Result<EventStatus, BackendError> {
        self.verified
            .borrow_mut()
            .push((event_id, tx_hash.to_string()));
        Ok(self.verification.get())
    }
}
