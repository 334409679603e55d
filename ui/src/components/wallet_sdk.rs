//! Browser bindings for the GemWallet extension and the Xumm SDK.
//!
//! The SDKs are reached through `assets/wallets.js`, which flattens their
//! responses into JSON-compatible values.

use async_trait::async_trait;
use js_sys::Promise;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use poap_common::error::SdkError;
use poap_common::gem::{GemEvent, GemPublicKey, GemSdk};
use poap_common::transaction::Transaction;
use poap_common::xumm::{PayloadOutcome, XummEvent, XummSdk, XummSession};

#[wasm_bindgen(module = "/assets/wallets.js")]
extern "C" {
    #[wasm_bindgen(js_name = gemIsInstalled)]
    fn gem_is_installed() -> Promise;
    #[wasm_bindgen(js_name = gemGetAddress)]
    fn gem_get_address() -> Promise;
    #[wasm_bindgen(js_name = gemGetNetwork)]
    fn gem_get_network() -> Promise;
    #[wasm_bindgen(js_name = gemGetPublicKey)]
    fn gem_get_public_key() -> Promise;
    #[wasm_bindgen(js_name = gemSignMessage)]
    fn gem_sign_message(message: &str) -> Promise;
    #[wasm_bindgen(js_name = gemSubmit)]
    fn gem_submit(transaction: JsValue) -> Promise;
    #[wasm_bindgen(js_name = gemOnEvent)]
    fn gem_on_event(callback: &Closure<dyn Fn(JsValue)>);

    #[wasm_bindgen(js_name = xummInit)]
    fn xumm_init(api_key: &str) -> bool;
    #[wasm_bindgen(js_name = xummAuthorize)]
    fn xumm_authorize() -> Promise;
    #[wasm_bindgen(js_name = xummRestore)]
    fn xumm_restore() -> Promise;
    #[wasm_bindgen(js_name = xummLogout)]
    fn xumm_logout() -> Promise;
    #[wasm_bindgen(js_name = xummCreatePayload)]
    fn xumm_create_payload(transaction: JsValue) -> Promise;
    #[wasm_bindgen(js_name = xummPayloadOutcome)]
    fn xumm_payload_outcome(uuid: &str) -> Promise;
    #[wasm_bindgen(js_name = xummOnEvent)]
    fn xumm_on_event(callback: &Closure<dyn Fn(JsValue)>);
}

fn js_error(err: JsValue) -> SdkError {
    let message = err
        .as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"));
    SdkError::Failed(message)
}

async fn settle<T: DeserializeOwned>(promise: Promise) -> Result<T, SdkError> {
    let value = JsFuture::from(promise).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(value).map_err(|e| SdkError::Failed(e.to_string()))
}

fn to_js(tx: &Transaction) -> Result<JsValue, SdkError> {
    tx.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| SdkError::Failed(e.to_string()))
}

// ─── GemWallet ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GemEventPayload {
    kind: String,
    value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GemKeyPayload {
    address: String,
    public_key: String,
}

pub struct BrowserGem;

#[async_trait(?Send)]
impl GemSdk for BrowserGem {
    async fn is_installed(&self) -> bool {
        settle::<bool>(gem_is_installed()).await.unwrap_or(false)
    }

    async fn get_address(&self) -> Result<Option<String>, SdkError> {
        settle(gem_get_address()).await
    }

    async fn get_network(&self) -> Result<Option<String>, SdkError> {
        settle(gem_get_network()).await
    }

    async fn get_public_key(&self) -> Result<Option<GemPublicKey>, SdkError> {
        let key: Option<GemKeyPayload> = settle(gem_get_public_key()).await?;
        Ok(key.map(|k| GemPublicKey {
            address: k.address,
            public_key: k.public_key,
        }))
    }

    async fn sign_message(&self, message: &str) -> Result<Option<String>, SdkError> {
        settle(gem_sign_message(message)).await
    }

    async fn submit(&self, tx: &Transaction) -> Result<Option<String>, SdkError> {
        settle(gem_submit(to_js(tx)?)).await
    }

    fn on_event(&self, listener: Box<dyn Fn(GemEvent)>) {
        let callback = Closure::wrap(Box::new(move |value: JsValue| {
            let Ok(payload) = serde_wasm_bindgen::from_value::<GemEventPayload>(value) else {
                return;
            };
            let event = match (payload.kind.as_str(), payload.value) {
                ("network", Some(name)) => GemEvent::NetworkChanged(name),
                ("wallet", Some(address)) => GemEvent::WalletChanged(address),
                ("logout", _) => GemEvent::Logout,
                _ => return,
            };
            listener(event);
        }) as Box<dyn Fn(JsValue)>);
        gem_on_event(&callback);
        callback.forget();
    }
}

// ─── Xumm ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SessionPayload {
    account: String,
    network: String,
    endpoint: Option<String>,
    jwt: String,
}

impl From<SessionPayload> for XummSession {
    fn from(p: SessionPayload) -> Self {
        XummSession {
            account: p.account,
            network: p.network,
            endpoint: p.endpoint,
            jwt: p.jwt,
        }
    }
}

#[derive(Deserialize)]
struct XummEventPayload {
    kind: String,
    session: Option<SessionPayload>,
}

#[derive(Deserialize)]
struct OutcomePayload {
    outcome: String,
    txid: Option<String>,
}

pub struct BrowserXumm;

impl BrowserXumm {
    /// Initialise the SDK. `None` when it is not loaded or no API key is
    /// configured.
    pub fn init(api_key: Option<&str>) -> Option<Self> {
        let api_key = api_key?;
        xumm_init(api_key).then_some(BrowserXumm)
    }
}

#[async_trait(?Send)]
impl XummSdk for BrowserXumm {
    async fn authorize(&self) -> Result<Option<XummSession>, SdkError> {
        let session: Option<SessionPayload> = settle(xumm_authorize()).await?;
        Ok(session.map(Into::into))
    }

    async fn restore(&self) -> Result<Option<XummSession>, SdkError> {
        let session: Option<SessionPayload> = settle(xumm_restore()).await?;
        Ok(session.map(Into::into))
    }

    async fn logout(&self) -> Result<(), SdkError> {
        JsFuture::from(xumm_logout()).await.map_err(js_error)?;
        Ok(())
    }

    async fn create_payload(&self, tx: &Transaction) -> Result<String, SdkError> {
        settle(xumm_create_payload(to_js(tx)?)).await
    }

    async fn payload_outcome(&self, uuid: &str) -> Result<PayloadOutcome, SdkError> {
        let payload: OutcomePayload = settle(xumm_payload_outcome(uuid)).await?;
        Ok(match (payload.outcome.as_str(), payload.txid) {
            ("signed", Some(txid)) if !txid.is_empty() => PayloadOutcome::Signed { txid },
            ("expired", _) => PayloadOutcome::Expired,
            _ => PayloadOutcome::Rejected,
        })
    }

    fn on_event(&self, listener: Box<dyn Fn(XummEvent)>) {
        let callback = Closure::wrap(Box::new(move |value: JsValue| {
            let Ok(payload) = serde_wasm_bindgen::from_value::<XummEventPayload>(value) else {
                return;
            };
            let event = match (payload.kind.as_str(), payload.session) {
                ("retrieved", Some(session)) => XummEvent::Retrieved(session.into()),
                ("success", Some(session)) => XummEvent::Success(session.into()),
                ("logout", _) => XummEvent::LoggedOut,
                _ => return,
            };
            listener(event);
        }) as Box<dyn Fn(JsValue)>);
        xumm_on_event(&callback);
        callback.forget();
    }
}
