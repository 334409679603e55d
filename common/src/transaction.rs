//! XRP Ledger transaction templates submitted for signing.
//!
//! Only the fields the platform sets are modelled; the wallet fills in
//! `Account`, `Fee` and `Sequence` before asking the user to sign.

use serde::{Deserialize, Serialize};

/// `AccountSet` flag allowing another account to mint NFTs on our behalf.
pub const ASF_AUTHORIZED_NFTOKEN_MINTER: u32 = 10;

/// 1 XRP in drops.
pub const DROPS_PER_XRP: u64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "TransactionType")]
pub enum Transaction {
    NFTokenAcceptOffer {
        #[serde(rename = "NFTokenSellOffer")]
        sell_offer: String,
    },
    AccountSet {
        #[serde(rename = "NFTokenMinter")]
        minter: String,
        #[serde(rename = "SetFlag")]
        set_flag: u32,
    },
    Payment {
        #[serde(rename = "Destination")]
        destination: String,
        /// Amount in drops.
        #[serde(rename = "Amount")]
        amount: String,
        #[serde(rename = "Memos", default, skip_serializing_if = "Vec::is_empty")]
        memos: Vec<MemoWrapper>,
    },
}

impl Transaction {
    pub fn accept_offer(offer_index: impl Into<String>) -> Self {
        Transaction::NFTokenAcceptOffer {
            sell_offer: offer_index.into(),
        }
    }

    pub fn authorize_minter(minter: impl Into<String>) -> Self {
        Transaction::AccountSet {
            minter: minter.into(),
            set_flag: ASF_AUTHORIZED_NFTOKEN_MINTER,
        }
    }

    pub fn payment(payment: &Payment) -> Self {
        Transaction::Payment {
            destination: payment.destination.clone(),
            amount: payment.amount_drops.to_string(),
            memos: payment
                .memo
                .as_deref()
                .map(|m| vec![MemoWrapper::new(m)])
                .unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoWrapper {
    #[serde(rename = "Memo")]
    pub memo: Memo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    /// Hex-encoded UTF-8 payload.
    #[serde(rename = "MemoData")]
    pub data: String,
}

impl MemoWrapper {
    pub fn new(text: &str) -> Self {
        Self {
            memo: Memo {
                data: encode_memo(text),
            },
        }
    }
}

/// Hex-encode memo text the way the ledger expects it (upper case).
pub fn encode_memo(text: &str) -> String {
    hex::encode_upper(text.as_bytes())
}

/// A payment to be signed by the connected account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub destination: String,
    pub amount_drops: u64,
    pub memo: Option<String>,
}

impl Payment {
    pub fn new(destination: impl Into<String>, amount_drops: u64) -> Self {
        Self {
            destination: destination.into(),
            amount_drops,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Format drops as an XRP amount for display, e.g. `12.5`.
pub fn drops_to_xrp(drops: u64) -> String {
    let whole = drops / DROPS_PER_XRP;
    let frac = drops % DROPS_PER_XRP;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac = format!("{frac:06}");
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}
