//! Shared fakes for the integration suite.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use passkey_wallet_core::activation::ActivationPort;
use passkey_wallet_core::authenticator::{
    AssertionRequest, AssertionResult, AuthenticatorPort, CreationRequest,
    CreationResult, PlatformError, SoftwareAuthenticator,
};
use passkey_wallet_core::config::WalletConfig;
use passkey_wallet_core::Environment;

/// Software authenticator that counts how often each primitive is invoked.
#[derive(Default)]
pub struct CountingAuthenticator {
    inner: SoftwareAuthenticator,
    pub creations: AtomicUsize,
    pub assertions: AtomicUsize,
}

impl CountingAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn creation_calls(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn assertion_calls(&self) -> usize {
        self.assertions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthenticatorPort for CountingAuthenticator {
    async fn create(
        &self,
        request: CreationRequest,
    ) -> Result<CreationResult, PlatformError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        self.inner.create(request).await
    }

    async fn get(
        &self,
        request: AssertionRequest,
    ) -> Result<AssertionResult, PlatformError> {
        self.assertions.fetch_add(1, Ordering::SeqCst);
        self.inner.get(request).await
    }
}

/// Activation port with a fixed outcome, counting invocations.
pub struct StaticActivation {
    outcome: bool,
    pub calls: AtomicUsize,
}

impl StaticActivation {
    pub fn new(outcome: bool) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActivationPort for StaticActivation {
    async fn activate(&self, _address: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }
}

#[allow(dead_code)]
pub fn test_config() -> WalletConfig {
    WalletConfig::for_environment("example.org", "Example", &Environment::Testnet)
}
