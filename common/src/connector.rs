use std::rc::Rc;

use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::provider::Provider;
use crate::state::ConnectorState;
use crate::wallet::WalletType;

/// One wallet integration.
///
/// Implementations own a [`ConnectorState`] and, while a session is
/// established, a [`Provider`]. Whatever lifecycle events the underlying SDK
/// emits, they end up as `state().update(..)` or `state().reset()` so callers
/// never need to know which wallet they are talking to.
#[async_trait(?Send)]
pub trait Connector {
    fn wallet_type(&self) -> WalletType;

    fn state(&self) -> &ConnectorState;

    /// Signing capability, present only while a session is established.
    fn provider(&self) -> Option<Rc<dyn Provider>>;

    /// Establish a session, prompting the user if needed.
    ///
    /// On failure the state is left as it was before the call.
    async fn activate(&self) -> Result<(), ConnectorError>;

    /// Restore a previous session without prompting. Returns whether a
    /// session was restored; a missing session is not an error.
    async fn connect_eagerly(&self) -> Result<bool, ConnectorError> {
        Ok(false)
    }

    /// Tear down the session with the SDK, then [`Connector::reset`].
    async fn deactivate(&self) -> Result<(), ConnectorError> {
        self.reset();
        Ok(())
    }

    /// Drop the provider and return the state to its defaults. Idempotent.
    fn reset(&self);
}

/// Placeholder connector used while no wallet is selected.
#[derive(Debug, Default)]
pub struct EmptyConnector {
    state: ConnectorState,
}

impl EmptyConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl Connector for EmptyConnector {
    fn wallet_type(&self) -> WalletType {
        WalletType::Empty
    }

    fn state(&self) -> &ConnectorState {
        &self.state
    }

    fn provider(&self) -> Option<Rc<dyn Provider>> {
        None
    }

    async fn activate(&self) -> Result<(), ConnectorError> {
        Ok(())
    }

    fn reset(&self) {
        self.state.reset();
    }
}
