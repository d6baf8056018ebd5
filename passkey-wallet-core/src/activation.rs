//! Best-effort funding of a freshly derived account on a test network.

use std::time::Duration;

use async_trait::async_trait;

/// Outbound port for account activation.
///
/// Activation is advisory: implementations report success or failure but
/// never error, and callers never roll back wallet creation on `false`.
#[async_trait]
pub trait ActivationPort: Send + Sync {
    /// Requests funding for `address`. Returns whether the endpoint accepted.
    async fn activate(&self, address: &str) -> bool;
}

/// Production activator: a single `GET <faucet>?addr=<address>` request.
///
/// No retries; the one attempt either lands or the account stays unfunded
/// until the user acts again.
pub struct FaucetActivator {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl FaucetActivator {
    /// Creates an activator against the given faucet endpoint.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Overrides the connection timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ActivationPort for FaucetActivator {
    async fn activate(&self, address: &str) -> bool {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("addr", address)])
            .timeout(self.timeout)
            .header(
                "User-Agent",
                format!("passkey-wallet-core/{}", env!("CARGO_PKG_VERSION")),
            );

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                log::info!("faucet funded account {address}");
                true
            }
            Ok(response) => {
                log::warn!(
                    "faucet returned status {} for account {address}",
                    response.status()
                );
                false
            }
            Err(err) => {
                log::warn!("faucet request failed for account {address}: {err}");
                false
            }
        }
    }
}
