//! Organizer flow: authorize the platform minter, register the event, pay the
//! deposit, show a summary.

use crate::backend::EventBackend;
use crate::error::BackendError;
use crate::event::{CreatedEvent, EventDraft, EventStatus, PlatformInfo};
use crate::provider::{Provider, SigningRequest};
use crate::workflow::{StepOutcome, Workflow, WorkflowStep};

pub const AUTHORIZE_DECLINED: &str = "Minter authorization was declined or expired. Please try again.";
pub const PAYMENT_DECLINED: &str = "The deposit payment was declined or expired. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSetupStep {
    Authorize,
    Register,
    Pay,
    Summary,
}

impl WorkflowStep for EventSetupStep {
    const ALL: &'static [Self] = &[
        EventSetupStep::Authorize,
        EventSetupStep::Register,
        EventSetupStep::Pay,
        EventSetupStep::Summary,
    ];

    fn label(self) -> &'static str {
        match self {
            EventSetupStep::Authorize => "Authorize",
            EventSetupStep::Register => "Register",
            EventSetupStep::Pay => "Pay",
            EventSetupStep::Summary => "Summary",
        }
    }
}

/// A deposit attempt after the backend has looked at it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentResult {
    /// The wallet did not sign.
    Unsigned(StepOutcome),
    Signed {
        hash: String,
        status: Result<EventStatus, String>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSetupContext {
    pub connected: bool,
    pub minter_authorized: bool,
    pub platform: Option<PlatformInfo>,
    pub event: Option<CreatedEvent>,
    pub acknowledged: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventSetupFlow {
    context: EventSetupContext,
    workflow: Workflow<EventSetupStep>,
    payment_hash: Option<String>,
}

impl EventSetupFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow(&self) -> &Workflow<EventSetupStep> {
        &self.workflow
    }

    pub fn context(&self) -> &EventSetupContext {
        &self.context
    }

    pub fn event(&self) -> Option<&CreatedEvent> {
        self.context.event.as_ref()
    }

    pub fn payment_hash(&self) -> Option<&str> {
        self.payment_hash.as_deref()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.context.connected = connected;
        if !connected {
            self.context.minter_authorized = false;
        }
        self.evaluate();
    }

    pub fn set_minter_authorized(&mut self, authorized: bool) {
        self.context.minter_authorized = authorized;
        self.evaluate();
    }

    /// Apply a status reported by the backend for the registered event.
    pub fn set_event_status(&mut self, status: EventStatus) {
        if let Some(event) = self.context.event.as_mut() {
            event.status = status;
        }
        self.evaluate();
    }

    pub fn acknowledge(&mut self) {
        self.context.acknowledged = true;
        self.evaluate();
    }

    pub fn clear_error(&mut self, step: EventSetupStep) {
        self.workflow.clear_error(step);
    }

    fn evaluate(&mut self) {
        let context = &self.context;
        self.workflow.evaluate(|step| match step {
            EventSetupStep::Authorize => context.connected && context.minter_authorized,
            EventSetupStep::Register => context.event.is_some(),
            EventSetupStep::Pay => context
                .event
                .as_ref()
                .is_some_and(|e| e.status.is_funded()),
            EventSetupStep::Summary => context.acknowledged,
        });
    }

    /// Fetch platform addresses and whether `account` already authorized the
    /// minter. Apply the answer with [`EventSetupFlow::apply_platform`].
    pub async fn fetch_platform<B: EventBackend + ?Sized>(
        backend: &B,
        account: &str,
    ) -> Result<(PlatformInfo, bool), BackendError> {
        let platform = backend.platform_info().await?;
        let authorized = backend.minter_authorized(account).await?;
        Ok((platform, authorized))
    }

    pub fn apply_platform(&mut self, loaded: Result<(PlatformInfo, bool), BackendError>) {
        match loaded {
            Ok((platform, authorized)) => {
                self.context.platform = Some(platform);
                self.set_minter_authorized(authorized);
            }
            Err(err) => self.workflow.set_error(EventSetupStep::Authorize, err.to_string()),
        }
    }

    pub async fn load<B: EventBackend + ?Sized>(&mut self, backend: &B, account: &str) {
        let loaded = Self::fetch_platform(backend, account).await;
        self.apply_platform(loaded);
    }

    /// Submit the minter authorization to the wallet.
    pub async fn request_authorization(
        &self,
        provider: &dyn Provider,
    ) -> Result<SigningRequest, String> {
        let platform = self
            .context
            .platform
            .as_ref()
            .ok_or_else(|| "Platform information is not loaded".to_string())?;
        provider
            .set_account(&platform.minter)
            .await
            .map_err(|e| e.to_string())
    }

    pub fn finish_authorization(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Signed(hash) => {
                tracing::info!(%hash, "minter authorized");
                self.set_minter_authorized(true);
            }
            StepOutcome::AlreadyDone => self.set_minter_authorized(true),
            StepOutcome::Declined => self
                .workflow
                .set_error(EventSetupStep::Authorize, AUTHORIZE_DECLINED),
            StepOutcome::Failed(message) => {
                self.workflow.set_error(EventSetupStep::Authorize, message)
            }
        }
    }

    pub async fn authorize(&mut self, provider: &dyn Provider) {
        self.clear_error(EventSetupStep::Authorize);
        if self.context.minter_authorized {
            return self.finish_authorization(StepOutcome::AlreadyDone);
        }
        let outcome = match self.request_authorization(provider).await {
            Ok(request) => StepOutcome::from_request(request).await,
            Err(message) => StepOutcome::Failed(message),
        };
        self.finish_authorization(outcome);
    }

    /// Validate `draft` and create the event on the backend. Record the
    /// answer with [`EventSetupFlow::finish_registration`].
    pub async fn create_event<B: EventBackend + ?Sized>(
        backend: &B,
        draft: &EventDraft,
    ) -> Result<CreatedEvent, String> {
        draft.validate()?;
        backend.create_event(draft).await.map_err(|e| e.to_string())
    }

    pub fn finish_registration(&mut self, created: Result<CreatedEvent, String>) {
        match created {
            Ok(created) => {
                tracing::info!(event_id = created.event_id, "event registered");
                self.context.event = Some(created);
                self.evaluate();
            }
            Err(message) => self.workflow.set_error(EventSetupStep::Register, message),
        }
    }

    pub async fn register<B: EventBackend + ?Sized>(&mut self, backend: &B, draft: &EventDraft) {
        self.clear_error(EventSetupStep::Register);
        let created = Self::create_event(backend, draft).await;
        self.finish_registration(created);
    }

    /// Submit the deposit payment to the wallet.
    pub async fn request_payment(&self, provider: &dyn Provider) -> Result<SigningRequest, String> {
        let event = self
            .context
            .event
            .as_ref()
            .ok_or_else(|| "Register the event first".to_string())?;
        provider
            .send_payment(&event.deposit)
            .await
            .map_err(|e| e.to_string())
    }

    /// Have the backend verify a signed deposit for `event_id`. Unsigned
    /// outcomes pass through untouched.
    pub async fn verify_payment<B: EventBackend + ?Sized>(
        backend: &B,
        event_id: Option<u32>,
        outcome: StepOutcome,
    ) -> PaymentResult {
        let StepOutcome::Signed(hash) = outcome else {
            return PaymentResult::Unsigned(outcome);
        };
        let status = match event_id {
            Some(event_id) => backend
                .verify_payment(event_id, &hash)
                .await
                .map_err(|e| e.to_string()),
            None => Err("Register the event first".to_string()),
        };
        PaymentResult::Signed { hash, status }
    }

    pub fn finish_payment(&mut self, result: PaymentResult) {
        match result {
            PaymentResult::Unsigned(StepOutcome::Declined) => {
                self.workflow.set_error(EventSetupStep::Pay, PAYMENT_DECLINED)
            }
            PaymentResult::Unsigned(StepOutcome::Failed(message)) => {
                self.workflow.set_error(EventSetupStep::Pay, message)
            }
            PaymentResult::Unsigned(_) => self.evaluate(),
            PaymentResult::Signed { hash, status } => {
                self.payment_hash = Some(hash.clone());
                match status {
                    Ok(status) => {
                        tracing::info!(%hash, ?status, "deposit verified");
                        self.set_event_status(status);
                        if !status.is_funded() {
                            self.workflow
                                .set_error(EventSetupStep::Pay, "Payment could not be verified yet");
                        }
                    }
                    Err(message) => self.workflow.set_error(EventSetupStep::Pay, message),
                }
            }
        }
    }

    pub async fn pay<B: EventBackend + ?Sized>(&mut self, backend: &B, provider: &dyn Provider) {
        self.clear_error(EventSetupStep::Pay);
        let outcome = match self.request_payment(provider).await {
            Ok(request) => StepOutcome::from_request(request).await,
            Err(message) => StepOutcome::Failed(message),
        };
        let event_id = self.event().map(|e| e.event_id);
        let result = Self::verify_payment(backend, event_id, outcome).await;
        self.finish_payment(result);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::mock::{MockEventBackend, MockProvider};
    use crate::network::NetworkId;
    use crate::transaction::Transaction;

    fn draft() -> EventDraft {
        let start = Utc::now();
        EventDraft {
            network_id: NetworkId::Testnet,
            title: "Meetup".into(),
            description: "Monthly meetup".into(),
            location: "Vienna".into(),
            image_url: None,
            token_count: 20,
            date_start: start,
            date_end: start + Duration::hours(3),
            is_managed: false,
        }
    }

    async fn loaded_flow(backend: &MockEventBackend) -> EventSetupFlow {
        let mut flow = EventSetupFlow::new();
        flow.set_connected(true);
        flow.load(backend, "rOrg").await;
        flow
    }

    #[tokio::test]
    async fn full_setup() {
        let backend = MockEventBackend::new();
        let provider = MockProvider::resolving(Some("HASH"));
        let mut flow = loaded_flow(&backend).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Authorize));

        flow.authorize(&provider).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Register));

        flow.register(&backend, &draft()).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));

        flow.pay(&backend, &provider).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Summary));
        assert_eq!(flow.payment_hash(), Some("HASH"));
        assert_eq!(backend.verified(), vec![(1, "HASH".to_string())]);

        flow.acknowledge();
        assert!(flow.workflow().is_terminal());

        let signed = provider.signed();
        assert_eq!(signed[0], Transaction::authorize_minter("rMinter"));
        assert!(matches!(signed[1], Transaction::Payment { .. }));
    }

    #[tokio::test]
    async fn existing_authorization_skips_prompt() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let provider = MockProvider::resolving(None);
        let mut flow = loaded_flow(&backend).await;

        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Register));
        flow.authorize(&provider).await;
        assert!(provider.signed().is_empty());
    }

    #[tokio::test]
    async fn declined_authorization() {
        let backend = MockEventBackend::new();
        let provider = MockProvider::resolving(None);
        let mut flow = loaded_flow(&backend).await;

        flow.authorize(&provider).await;
        let status = flow.workflow().status(EventSetupStep::Authorize);
        assert!(!status.complete);
        assert_eq!(status.error.as_deref(), Some(AUTHORIZE_DECLINED));
    }

    #[tokio::test]
    async fn invalid_draft_is_not_sent() {
        let backend = MockEventBackend::new();
        let mut flow = loaded_flow(&backend).await;
        let mut bad = draft();
        bad.token_count = 0;

        flow.register(&backend, &bad).await;
        assert!(flow.workflow().status(EventSetupStep::Register).error.is_some());
        assert!(flow.event().is_none());
    }

    #[tokio::test]
    async fn declined_payment_keeps_pay_open() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let provider = MockProvider::resolving(None);
        let mut flow = loaded_flow(&backend).await;
        flow.register(&backend, &draft()).await;

        flow.pay(&backend, &provider).await;
        let status = flow.workflow().status(EventSetupStep::Pay);
        assert!(!status.complete);
        assert_eq!(status.error.as_deref(), Some(PAYMENT_DECLINED));
        assert!(backend.verified().is_empty());
    }

    #[tokio::test]
    async fn unverified_payment_reports_error() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        backend.set_verification_status(EventStatus::Pending);
        let provider = MockProvider::resolving(Some("HASH"));
        let mut flow = loaded_flow(&backend).await;
        flow.register(&backend, &draft()).await;

        flow.pay(&backend, &provider).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));
        assert!(flow.workflow().status(EventSetupStep::Pay).error.is_some());
    }

    #[tokio::test]
    async fn disconnect_reopens_authorize() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let mut flow = loaded_flow(&backend).await;
        flow.register(&backend, &draft()).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));

        flow.set_connected(false);
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Authorize));
        assert!(flow.workflow().status(EventSetupStep::Register).complete);
    }

    #[tokio::test]
    async fn canceled_event_reopens_pay() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let provider = MockProvider::resolving(Some("HASH"));
        let mut flow = loaded_flow(&backend).await;
        flow.register(&backend, &draft()).await;
        flow.pay(&backend, &provider).await;
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Summary));

        flow.set_event_status(EventStatus::Canceled);
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));
    }

    #[tokio::test]
    async fn payment_result_keeps_disconnect_made_while_verifying() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let mut flow = loaded_flow(&backend).await;
        flow.register(&backend, &draft()).await;

        let event_id = flow.event().map(|e| e.event_id);
        let outcome = StepOutcome::Signed("HASH".into());
        let verifying = EventSetupFlow::verify_payment(&backend, event_id, outcome);
        flow.set_connected(false);
        let result = verifying.await;
        flow.finish_payment(result);

        assert_eq!(flow.payment_hash(), Some("HASH"));
        assert!(flow.workflow().status(EventSetupStep::Pay).complete);
        assert!(!flow.context().connected);
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Authorize));
    }

    #[tokio::test]
    async fn platform_result_keeps_event_registered_while_loading() {
        let backend = MockEventBackend::new();
        backend.set_authorized(true);
        let mut flow = EventSetupFlow::new();
        flow.set_connected(true);

        let loaded = EventSetupFlow::fetch_platform(&backend, "rOrg").await;
        flow.finish_registration(EventSetupFlow::create_event(&backend, &draft()).await);
        flow.apply_platform(loaded);

        assert!(flow.event().is_some());
        assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));
    }

    #[tokio::test]
    async fn payment_without_event_is_rejected() {
        let backend = MockEventBackend::new();
        let result =
            EventSetupFlow::verify_payment(&backend, None, StepOutcome::Signed("HASH".into())).await;
        let mut flow = EventSetupFlow::new();
        flow.finish_payment(result);

        assert!(flow.workflow().status(EventSetupStep::Pay).error.is_some());
        assert!(backend.verified().is_empty());
    }
}
