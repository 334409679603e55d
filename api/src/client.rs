//! HTTP client for the POAP platform backend.
//!
//! Every endpoint answers with a JSON envelope: `{"result": ...}` on success,
//! `{"error": "..."}` on failure. The caller is identified by the bearer token
//! obtained at login (see [`crate::auth::AuthSession`]).

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use poap_common::backend::{ClaimBackend, EventBackend};
use poap_common::config::AppConfig;
use poap_common::error::BackendError;
use poap_common::event::{
    CreatedEvent, EventDraft, EventInfo, EventStatus, Offer, PlatformInfo, PlatformStats,
};
use poap_common::provider::AuthData;
use poap_common::wallet::WalletType;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, GENERIC_ERROR};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreloginRequest<'a> {
    wallet_address: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    wallet_address: &'a str,
    wallet_type: WalletType,
    data: &'a AuthData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    event_id: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentCheckRequest<'a> {
    event_id: u32,
    tx_hash: &'a str,
}

#[derive(Deserialize)]
struct PaymentCheckResponse {
    status: EventStatus,
}

// ─── Client ──────────────────────────────────────────────────────────────────

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    #[cfg_attr(target_family = "wasm", allow(dead_code))]
    timeout: Duration,
    token: RefCell<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            token: RefCell::new(None),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    // ── Health ──

    pub async fn heartbeat(&self) -> Result<(), ApiError> {
        self.call(Method::GET, "/heartbeat", None::<&()>).await?;
        Ok(())
    }

    // ── Auth ──

    /// Ask for the challenge `address` has to sign to log in.
    pub async fn prelogin(&self, address: &str) -> Result<String, ApiError> {
        let body = PreloginRequest {
            wallet_address: address,
        };
        self.fetch(Method::POST, "/auth/prelogin", Some(&body)).await
    }

    /// Exchange wallet proof for a JWT. Does not store the token.
    pub async fn login(
        &self,
        address: &str,
        wallet: WalletType,
        data: &AuthData,
    ) -> Result<String, ApiError> {
        let body = LoginRequest {
            wallet_address: address,
            wallet_type: wallet,
            data,
        };
        self.fetch(Method::POST, "/auth/login", Some(&body)).await
    }

    pub async fn refresh(&self) -> Result<String, ApiError> {
        self.fetch(Method::POST, "/auth/refresh", None::<&()>).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.call(Method::POST, "/auth/logout", None::<&()>).await?;
        Ok(())
    }

    // ── Events ──

    pub async fn event_info(&self, event_id: u32) -> Result<EventInfo, ApiError> {
        let path = format!("/events/info/{event_id}");
        self.fetch(Method::GET, &path, None::<&()>).await
    }

    /// Events organized by the logged-in account.
    pub async fn owned_events(&self) -> Result<Vec<EventInfo>, ApiError> {
        self.fetch(Method::GET, "/events/owned", None::<&()>).await
    }

    pub async fn public_events(&self, limit: Option<u32>) -> Result<Vec<EventInfo>, ApiError> {
        let path = match limit {
            Some(limit) => format!("/events/public?limit={limit}"),
            None => "/events/public".to_string(),
        };
        self.fetch(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent, ApiError> {
        self.fetch(Method::POST, "/events/create", Some(draft)).await
    }

    pub async fn cancel_event(&self, event_id: u32) -> Result<(), ApiError> {
        let path = format!("/events/cancel/{event_id}");
        self.call(Method::POST, &path, None::<&()>).await?;
        Ok(())
    }

    // ── Claims ──

    /// Join an event; the backend reserves an NFT offer for the caller.
    pub async fn join_event(&self, event_id: u32) -> Result<Offer, ApiError> {
        self.fetch(Method::POST, "/events/join", Some(&JoinRequest { event_id }))
            .await
    }

    /// The caller's offer for an event, `None` if they never joined.
    pub async fn claim_offer(&self, event_id: u32) -> Result<Option<Offer>, ApiError> {
        let path = format!("/offers/{event_id}");
        self.fetch(Method::GET, &path, None::<&()>).await
    }

    // ── Platform ──

    pub async fn platform_info(&self) -> Result<PlatformInfo, ApiError> {
        self.fetch(Method::GET, "/platform/info", None::<&()>).await
    }

    /// Whether the caller authorized the platform minter.
    pub async fn user_minter(&self) -> Result<bool, ApiError> {
        self.fetch(Method::GET, "/user/minter", None::<&()>).await
    }

    pub async fn check_payment(&self, event_id: u32, tx_hash: &str) -> Result<EventStatus, ApiError> {
        let body = PaymentCheckRequest { event_id, tx_hash };
        let response: PaymentCheckResponse =
            self.fetch(Method::POST, "/payment/check", Some(&body)).await?;
        Ok(response.status)
    }

    pub async fn admin_stats(&self) -> Result<PlatformStats, ApiError> {
        self.fetch(Method::GET, "/admin/stats", None::<&()>).await
    }

    // ── Plumbing ──

    async fn fetch<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let result = self.call(method, path, body).await?;
        serde_json::from_value(result).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    async fn call<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.prepare(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Bodies that are not an envelope (proxies, crashes) count as empty.
        let envelope: Envelope = serde_json::from_str(&text).unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%url, "api token rejected");
            self.set_token(None);
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() || envelope.error.is_some() {
            let message = envelope
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            tracing::warn!(%url, status = status.as_u16(), %message, "api request failed");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(envelope.result)
    }

    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        #[cfg(not(target_family = "wasm"))]
        let request = request.timeout(self.timeout);
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

// ─── Workflow backends ───────────────────────────────────────────────────────

#[async_trait(?Send)]
impl ClaimBackend for ApiClient {
    async fn request_offer(&self, event_id: u32, account: &str) -> Result<Offer, BackendError> {
        tracing::debug!(event_id, account, "joining event");
        Ok(self.join_event(event_id).await?)
    }

    async fn claim_status(
        &self,
        event_id: u32,
        _account: &str,
    ) -> Result<Option<Offer>, BackendError> {
        Ok(self.claim_offer(event_id).await?)
    }
}

#[async_trait(?Send)]
impl EventBackend for ApiClient {
    async fn platform_info(&self) -> Result<PlatformInfo, BackendError> {
        Ok(ApiClient::platform_info(self).await?)
    }

    async fn minter_authorized(&self, _account: &str) -> Result<bool, BackendError> {
        Ok(self.user_minter().await?)
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent, BackendError> {
        Ok(ApiClient::create_event(self, draft).await?)
    }

    async fn verify_payment(
        &self,
        event_id: u32,
        tx_hash: &str,
    ) -> Result<EventStatus, BackendError> {
        Ok(self.check_payment(event_id, tx_hash).await?)
    }
}
