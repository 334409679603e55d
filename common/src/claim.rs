//! Attendee flow: connect a wallet, claim the event NFT, show a summary.

use crate::backend::ClaimBackend;
use crate::provider::{Provider, SigningRequest};
use crate::workflow::{StepOutcome, Workflow, WorkflowStep};

pub const DECLINED_MESSAGE: &str = "The NFT offer was declined or expired. Please try again.";
pub const MINTING_MESSAGE: &str = "Your NFT is still being minted. Please try again shortly.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimStep {
    Connect,
    Claim,
    Summary,
}

impl WorkflowStep for ClaimStep {
    const ALL: &'static [Self] = &[ClaimStep::Connect, ClaimStep::Claim, ClaimStep::Summary];

    fn label(self) -> &'static str {
        match self {
            ClaimStep::Connect => "Connect",
            ClaimStep::Claim => "Claim",
            ClaimStep::Summary => "Summary",
        }
    }
}

/// External facts the claim steps are derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimContext {
    /// A wallet session is active.
    pub connected: bool,
    /// The connected account holds the event NFT.
    pub claimed: bool,
    /// The user dismissed the summary.
    pub acknowledged: bool,
}

/// What has to happen to claim, as decided by the backend.
pub enum ClaimRequest {
    AlreadyClaimed,
    Signing(SigningRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimFlow {
    event_id: u32,
    context: ClaimContext,
    workflow: Workflow<ClaimStep>,
    claim_hash: Option<String>,
}

impl ClaimFlow {
    pub fn new(event_id: u32) -> Self {
        Self {
            event_id,
            context: ClaimContext::default(),
            workflow: Workflow::new(),
            claim_hash: None,
        }
    }

    pub fn event_id(&self) -> u32 {
        self.event_id
    }

    pub fn workflow(&self) -> &Workflow<ClaimStep> {
        &self.workflow
    }

    pub fn context(&self) -> &ClaimContext {
        &self.context
    }

    /// Hash of the accept-offer transaction signed in this session.
    pub fn claim_hash(&self) -> Option<&str> {
        self.claim_hash.as_deref()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.context.connected = connected;
        if !connected {
            self.context.claimed = false;
            self.claim_hash = None;
        }
        self.evaluate();
    }

    pub fn set_claimed(&mut self, claimed: bool) {
        self.context.claimed = claimed;
        self.evaluate();
    }

    pub fn acknowledge(&mut self) {
        self.context.acknowledged = true;
        self.evaluate();
    }

    /// Drop the Claim step's error before a new attempt.
    pub fn clear_error(&mut self) {
        self.workflow.clear_error(ClaimStep::Claim);
    }

    fn evaluate(&mut self) {
        let context = &self.context;
        // A claim signed here counts even before the backend catches up.
        let held = context.claimed || self.claim_hash.is_some();
        self.workflow.evaluate(|step| match step {
            ClaimStep::Connect => context.connected,
            ClaimStep::Claim => context.connected && held,
            ClaimStep::Summary => context.acknowledged,
        });
    }

    /// Re-read the claim status of `account` from the backend.
    pub async fn refresh<B: ClaimBackend + ?Sized>(&mut self, backend: &B, account: &str) {
        match backend.claim_status(self.event_id, account).await {
            Ok(offer) => self.set_claimed(offer.is_some_and(|o| o.claimed)),
            Err(err) => self.workflow.set_error(ClaimStep::Claim, err.to_string()),
        }
    }

    /// Ask the backend for the offer and submit it to the wallet.
    ///
    /// Split from [`ClaimFlow::finish_claim`] so a caller can surface the
    /// request's deep link while the user decides.
    pub async fn request<B: ClaimBackend + ?Sized>(
        backend: &B,
        provider: &dyn Provider,
        event_id: u32,
        account: &str,
    ) -> Result<ClaimRequest, String> {
        let offer = backend
            .request_offer(event_id, account)
            .await
            .map_err(|e| e.to_string())?;
        if offer.claimed {
            return Ok(ClaimRequest::AlreadyClaimed);
        }
        let offer_index = offer.offer_index.ok_or_else(|| MINTING_MESSAGE.to_string())?;
        provider
            .accept_offer(&offer_index)
            .await
            .map(ClaimRequest::Signing)
            .map_err(|e| e.to_string())
    }

    /// Record the outcome of a claim attempt.
    pub fn finish_claim(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Signed(hash) => {
                tracing::info!(event_id = self.event_id, %hash, "NFT claimed");
                self.claim_hash = Some(hash);
                self.set_claimed(true);
            }
            StepOutcome::AlreadyDone => self.set_claimed(true),
            StepOutcome::Declined => self.workflow.set_error(ClaimStep::Claim, DECLINED_MESSAGE),
            StepOutcome::Failed(message) => self.workflow.set_error(ClaimStep::Claim, message),
        }
    }

    /// Run a whole claim attempt. Never fails: problems end up as the Claim
    /// step's error.
    pub async fn claim<B: ClaimBackend + ?Sized>(
        &mut self,
        backend: &B,
        provider: &dyn Provider,
        account: &str,
    ) {
        self.clear_error();
        let outcome = match Self::request(backend, provider, self.event_id, account).await {
            Ok(ClaimRequest::AlreadyClaimed) => StepOutcome::AlreadyDone,
            Ok(ClaimRequest::Signing(request)) => StepOutcome::from_request(request).await,
            Err(message) => StepOutcome::Failed(message),
        };
        self.finish_claim(outcome);
    }
}
