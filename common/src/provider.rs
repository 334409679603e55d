//! Signing capability handed out by a connected wallet.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::transaction::Payment;

/// A transaction handed to the wallet for user confirmation.
///
/// `uuid` is a correlation token (Xumm payload id) the caller can turn into a
/// deep link to the companion app. `resolved` settles to the transaction hash
/// once the user signs, or to `None` if they decline or the request expires.
/// `None` is an ordinary outcome the caller should offer to retry.
pub struct SigningRequest {
    pub uuid: Option<String>,
    pub resolved: LocalBoxFuture<'static, Option<String>>,
}

impl SigningRequest {
    pub fn pending(
        uuid: Option<String>,
        resolved: impl Future<Output = Option<String>> + 'static,
    ) -> Self {
        Self {
            uuid,
            resolved: resolved.boxed_local(),
        }
    }

    /// A request whose outcome is already known.
    pub fn ready(hash: Option<String>) -> Self {
        Self::pending(None, futures::future::ready(hash))
    }

    /// Custom-scheme link that opens the request in the Xumm app.
    pub fn deep_link(&self) -> Option<String> {
        self.uuid
            .as_ref()
            .map(|uuid| format!("xumm://xumm.app/sign/{uuid}/deeplink"))
    }

    /// Web fallback for [`SigningRequest::deep_link`].
    pub fn web_link(&self) -> Option<String> {
        self.uuid
            .as_ref()
            .map(|uuid| format!("https://xumm.app/sign/{uuid}"))
    }

    /// Wait for the user's decision.
    pub async fn wait(self) -> Option<String> {
        self.resolved.await
    }
}

impl fmt::Debug for SigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningRequest")
            .field("uuid", &self.uuid)
            .finish_non_exhaustive()
    }
}

/// Proof of account ownership presented to the backend at login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthData {
    /// JWT issued by Xumm for the authorized session.
    #[serde(rename_all = "camelCase")]
    Xumm { jwt: String },
    /// Signature over the backend's login challenge.
    #[serde(rename_all = "camelCase")]
    Gem {
        public_key: String,
        signature: String,
    },
}

/// Wallet-signing operations available while a session is established.
#[async_trait(?Send)]
pub trait Provider {
    /// Accept an NFT sell offer (claim the attendance token).
    async fn accept_offer(&self, offer_index: &str) -> Result<SigningRequest, ProviderError>;

    /// Authorize `minter` to mint NFTs on behalf of the connected account.
    async fn set_account(&self, minter: &str) -> Result<SigningRequest, ProviderError>;

    /// Send a payment from the connected account.
    async fn send_payment(&self, payment: &Payment) -> Result<SigningRequest, ProviderError>;

    /// Produce login credentials answering the backend's `challenge`.
    async fn get_auth_data(&self, challenge: &str) -> Result<AuthData, ProviderError>;
}
