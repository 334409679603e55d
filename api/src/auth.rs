use std::rc::Rc;

use poap_common::provider::Provider;
use poap_common::session::SessionStore;
use poap_common::wallet::WalletType;

use crate::client::ApiClient;
use crate::error::{ApiError, AuthError};

/// Backend login for the connected wallet account.
///
/// Tokens are cached per account in the [`SessionStore`], so switching back
/// to an account seen earlier in the session does not prompt the wallet
/// again.
pub struct AuthSession {
    client: Rc<ApiClient>,
    store: SessionStore,
}

impl AuthSession {
    pub fn new(client: Rc<ApiClient>, store: SessionStore) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &Rc<ApiClient> {
        &self.client
    }

    /// Use the cached token for `account`, if there is one.
    pub fn resume(&self, account: &str) -> bool {
        let token = self.store.auth_token(account);
        let found = token.is_some();
        self.client.set_token(token);
        found
    }

    /// Prove ownership of `account` through the wallet and store the JWT.
    pub async fn login(
        &self,
        account: &str,
        wallet: WalletType,
        provider: &dyn Provider,
    ) -> Result<(), AuthError> {
        let challenge = self.client.prelogin(account).await?;
        let data = provider.get_auth_data(&challenge).await?;
        let token = self.client.login(account, wallet, &data).await?;

        tracing::info!(%account, %wallet, "logged in");
        self.store.set_auth_token(account, &token);
        self.client.set_token(Some(token));
        Ok(())
    }

    /// Resume a cached login or start a new one.
    pub async fn ensure(
        &self,
        account: &str,
        wallet: WalletType,
        provider: &dyn Provider,
    ) -> Result<(), AuthError> {
        if self.resume(account) {
            return Ok(());
        }
        self.login(account, wallet, provider).await
    }

    /// Trade the current token for a fresh one.
    pub async fn refresh(&self, account: &str) -> Result<(), ApiError> {
        match self.client.refresh().await {
            Ok(token) => {
                self.store.set_auth_token(account, &token);
                self.client.set_token(Some(token));
                Ok(())
            }
            Err(err) => {
                if err == ApiError::Unauthorized {
                    self.store.remove_auth_token(account);
                }
                Err(err)
            }
        }
    }

    /// End the backend session. Local state is cleared even when the backend
    /// call fails.
    pub async fn logout(&self, account: &str) {
        if self.client.is_authenticated() {
            if let Err(err) = self.client.logout().await {
                tracing::warn!(%err, "backend logout failed");
            }
        }
        self.store.remove_auth_token(account);
        self.client.set_token(None);
    }
}
