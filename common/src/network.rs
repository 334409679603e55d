use std::fmt;

use serde::{Deserialize, Serialize};

/// XRP Ledger network a wallet session is bound to.
///
/// Wallet SDKs each describe the network differently (display names, upper
/// case identifiers, websocket endpoints); everything is normalized into this
/// closed set so the rest of the application never sees SDK-specific strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
    Mainnet,
    Testnet,
    Devnet,
    AmmDevnet,
    #[default]
    Unknown,
}

impl NetworkId {
    /// Normalize a network name as reported by a wallet SDK.
    ///
    /// Matching ignores case, `-` and `_`, so `"AMM-Devnet"`, `"AMMDEVNET"` and
    /// `"amm_devnet"` all map to [`NetworkId::AmmDevnet`].
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "mainnet" => NetworkId::Mainnet,
            "testnet" => NetworkId::Testnet,
            "devnet" => NetworkId::Devnet,
            "ammdevnet" => NetworkId::AmmDevnet,
            _ => NetworkId::Unknown,
        }
    }

    /// Normalize a websocket endpoint (e.g. `wss://s.altnet.rippletest.net:51233`).
    pub fn from_endpoint(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains("amm") {
            NetworkId::AmmDevnet
        } else if url.contains("s.devnet.") {
            NetworkId::Devnet
        } else if url.contains("altnet") || url.contains("testnet") {
            NetworkId::Testnet
        } else if url.contains("xrplcluster.com")
            || url.contains("s1.ripple.com")
            || url.contains("s2.ripple.com")
        {
            NetworkId::Mainnet
        } else {
            NetworkId::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Testnet => "testnet",
            NetworkId::Devnet => "devnet",
            NetworkId::AmmDevnet => "amm-devnet",
            NetworkId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gem_network_names() {
        assert_eq!(NetworkId::from_name("Mainnet"), NetworkId::Mainnet);
        assert_eq!(NetworkId::from_name("Testnet"), NetworkId::Testnet);
        assert_eq!(NetworkId::from_name("Devnet"), NetworkId::Devnet);
        assert_eq!(NetworkId::from_name("AMM-Devnet"), NetworkId::AmmDevnet);
    }

    #[test]
    fn xumm_network_names() {
        assert_eq!(NetworkId::from_name("MAINNET"), NetworkId::Mainnet);
        assert_eq!(NetworkId::from_name("TESTNET"), NetworkId::Testnet);
        assert_eq!(NetworkId::from_name("AMMDEVNET"), NetworkId::AmmDevnet);
        assert_eq!(NetworkId::from_name("CUSTOM"), NetworkId::Unknown);
        assert_eq!(NetworkId::from_name(""), NetworkId::Unknown);
    }

    #[test]
    fn endpoints() {
        assert_eq!(
            NetworkId::from_endpoint("wss://xrplcluster.com"),
            NetworkId::Mainnet
        );
        assert_eq!(
            NetworkId::from_endpoint("wss://s.altnet.rippletest.net:51233"),
            NetworkId::Testnet
        );
        assert_eq!(
            NetworkId::from_endpoint("wss://s.devnet.rippletest.net:51233"),
            NetworkId::Devnet
        );
        assert_eq!(
            NetworkId::from_endpoint("wss://amm.devnet.rippletest.net:51233"),
            NetworkId::AmmDevnet
        );
        assert_eq!(
            NetworkId::from_endpoint("wss://example.org"),
            NetworkId::Unknown
        );
    }
}
