//! Session state that survives page reloads within a browsing session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::wallet::WalletType;

const AUTH_KEY: &str = "auth";
const WALLET_KEY: &str = "wallet";

/// String key/value storage (browser `sessionStorage`, or memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Typed view over the persisted auth tokens and wallet choice.
#[derive(Clone)]
pub struct SessionStore {
    store: Rc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()))
    }

    /// Backend JWTs keyed by account address.
    pub fn auth_tokens(&self) -> HashMap<String, String> {
        let Some(raw) = self.store.get(AUTH_KEY) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(%err, "discarding unreadable auth token map");
            HashMap::new()
        })
    }

    pub fn auth_token(&self, account: &str) -> Option<String> {
        self.auth_tokens().remove(account)
    }

    pub fn set_auth_token(&self, account: &str, jwt: &str) {
        let mut tokens = self.auth_tokens();
        tokens.insert(account.to_string(), jwt.to_string());
        self.write_tokens(&tokens);
    }

    pub fn remove_auth_token(&self, account: &str) {
        let mut tokens = self.auth_tokens();
        if tokens.remove(account).is_some() {
            self.write_tokens(&tokens);
        }
    }

    pub fn clear_auth(&self) {
        self.store.remove(AUTH_KEY);
    }

    /// Wallet to reconnect on load. `Empty` is never persisted.
    pub fn last_wallet(&self) -> Option<WalletType> {
        self.store
            .get(WALLET_KEY)
            .and_then(|tag| WalletType::from_tag(&tag))
            .filter(|w| *w != WalletType::Empty)
    }

    pub fn set_last_wallet(&self, wallet: Option<WalletType>) {
        match wallet {
            Some(w) if w != WalletType::Empty => self.store.set(WALLET_KEY, w.as_str()),
            _ => self.store.remove(WALLET_KEY),
        }
    }

    fn write_tokens(&self, tokens: &HashMap<String, String>) {
        match serde_json::to_string(tokens) {
            Ok(raw) => self.store.set(AUTH_KEY, &raw),
            Err(err) => tracing::warn!(%err, "failed to persist auth tokens"),
        }
    }
}
