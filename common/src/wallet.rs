use std::fmt;

use serde::{Deserialize, Serialize};

/// The wallet integrations the platform knows how to talk to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletType {
    /// No wallet selected.
    #[default]
    Empty,
    /// Xumm mobile app, reached through the OAuth2 PKCE flow.
    Xumm,
    /// GemWallet browser extension.
    Gem,
}

impl WalletType {
    pub const ALL: [WalletType; 3] = [WalletType::Empty, WalletType::Xumm, WalletType::Gem];

    /// Stable tag used when persisting the last selected wallet.
    pub fn as_str(self) -> &'static str {
        match self {
            WalletType::Empty => "EMPTY",
            WalletType::Xumm => "XUMM",
            WalletType::Gem => "GEM",
        }
    }

    /// Parse a persisted tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.as_str() == tag)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WalletType::Empty => "No wallet",
            WalletType::Xumm => "Xumm",
            WalletType::Gem => "GemWallet",
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
