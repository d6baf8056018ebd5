//! Relying-party and network configuration for the wallet flows.

use crate::authenticator::UserVerification;
use crate::Environment;

/// Default faucet endpoint for the test network.
pub static TESTNET_FAUCET_URL: &str = "https://faucet.testnet.passkey-wallet.dev/fund";

/// COSE algorithm identifier for Ed25519.
pub const ALG_ED25519: i32 = -8;

/// COSE algorithm identifier for ECDSA P-256, accepted as a fallback.
pub const ALG_ES256: i32 = -7;

/// Configuration for a `PasskeyWallet`, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Relying-party identifier the credentials bind to.
    pub rp_id: String,
    /// Human-readable relying-party name.
    pub rp_name: String,
    /// Funding endpoint, present only on test networks.
    pub faucet_url: Option<String>,
    /// Accepted COSE algorithms, most preferred first.
    pub algorithms: Vec<i32>,
    /// Authenticator gesture timeout in milliseconds.
    pub timeout_ms: u32,
    /// User-verification policy applied to both flows.
    pub user_verification: UserVerification,
}

impl WalletConfig {
    /// Builds a configuration with defaults for the given environment.
    ///
    /// Only [`Environment::Testnet`] carries a faucet endpoint; accounts on
    /// mainnet are never auto-funded.
    #[must_use]
    pub fn for_environment(
        rp_id: impl Into<String>,
        rp_name: impl Into<String>,
        environment: &Environment,
    ) -> Self {
        let faucet_url = match environment {
            Environment::Testnet => Some(TESTNET_FAUCET_URL.to_string()),
            Environment::Mainnet => None,
        };
        Self {
            rp_id: rp_id.into(),
            rp_name: rp_name.into(),
            faucet_url,
            algorithms: vec![ALG_ED25519, ALG_ES256],
            timeout_ms: 60_000,
            user_verification: UserVerification::Required,
        }
    }

    /// Overrides the faucet endpoint.
    #[must_use]
    pub fn with_faucet_url(mut self, url: impl Into<String>) -> Self {
        self.faucet_url = Some(url.into());
        self
    }

    /// Overrides the gesture timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_defaults_carry_a_faucet() {
        let config =
            WalletConfig::for_environment("example.org", "Example", &Environment::Testnet);
        assert_eq!(config.faucet_url.as_deref(), Some(TESTNET_FAUCET_URL));
        assert_eq!(config.algorithms[0], ALG_ED25519);
        assert_eq!(config.timeout_ms, 60_000);
    }

    #[test]
    fn mainnet_has_no_faucet() {
        let config =
            WalletConfig::for_environment("example.org", "Example", &Environment::Mainnet);
        assert!(config.faucet_url.is_none());
    }

    #[test]
    fn builders_override_defaults() {
        let config =
            WalletConfig::for_environment("example.org", "Example", &Environment::Mainnet)
                .with_faucet_url("http://localhost:8000/fund")
                .with_timeout_ms(5_000);
        assert_eq!(config.faucet_url.as_deref(), Some("http://localhost:8000/fund"));
        assert_eq!(config.timeout_ms, 5_000);
    }
}
