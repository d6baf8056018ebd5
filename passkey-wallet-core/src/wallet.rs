//! The authentication orchestrator.
//!
//! Sequences the authenticator adapter, wallet derivation, activation and the
//! credential store into the two public flows, and enforces the
//! address-consistency invariant between them.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::activation::ActivationPort;
use crate::authenticator::{
    AssertionOptions, AuthenticatorAdapter, AuthenticatorPort, CreationOptions,
};
use crate::config::WalletConfig;
use crate::derivation::derive_wallet;
use crate::error::PasskeyWalletError;
use crate::store::{CredentialStore, StoredCredentialRecord};

/// Outcome of a completed flow, handed back to the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    /// Local session marker: a timestamp plus a credential-id fragment.
    ///
    /// Carries no cryptographic authority; it must never be presented to a
    /// remote service as a bearer credential.
    pub token: String,
    /// The account address for this session.
    pub account_address: String,
    /// Opaque user identifier.
    pub user_id: String,
    /// Human-readable outcome for UI display. Not machine-parseable.
    pub message: String,
    /// Advisory failure (activation), separate from the success message.
    pub warning: Option<String>,
}

/// States a flow moves through. `Failed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No flow in progress.
    Idle,
    /// Generating fresh challenge options.
    BuildingOptions,
    /// Suspended on the platform gesture.
    AwaitingAuthenticator,
    /// Recomputing the keypair from the credential identifiers.
    DerivingWallet,
    /// Requesting test-network funding (creation path).
    Activating,
    /// Writing the credential record (creation path).
    Persisting,
    /// Checking the derived address against the stored record (auth path).
    Verifying,
    /// Flow completed.
    Done,
    /// Flow aborted; nothing partial was persisted.
    Failed,
}

/// Tracks one flow's progress through [`FlowState`].
struct Flow {
    label: &'static str,
    state: FlowState,
}

impl Flow {
    const fn new(label: &'static str) -> Self {
        Self {
            label,
            state: FlowState::Idle,
        }
    }

    fn advance(&mut self, next: FlowState) {
        log::debug!("{}: {:?} -> {:?}", self.label, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: &PasskeyWalletError) {
        log::debug!("{}: failed in {:?}: {error}", self.label, self.state);
        self.state = FlowState::Failed;
    }
}

/// The orchestrator for the create-wallet and authenticate flows.
///
/// Constructed with explicit collaborators so every environment dependency is
/// injectable. Holds no mutable state across flows; the surrounding
/// application runs at most one flow at a time.
pub struct PasskeyWallet {
    adapter: AuthenticatorAdapter,
    activation: Option<Arc<dyn ActivationPort>>,
    store: Arc<dyn CredentialStore>,
    config: WalletConfig,
}

impl PasskeyWallet {
    /// Creates an orchestrator over the given collaborators.
    ///
    /// `activation` is `None` when the configured network has no funding
    /// endpoint; the creation flow then skips activation entirely.
    #[must_use]
    pub fn new(
        authenticator: Arc<dyn AuthenticatorPort>,
        activation: Option<Arc<dyn ActivationPort>>,
        store: Arc<dyn CredentialStore>,
        config: WalletConfig,
    ) -> Self {
        Self {
            adapter: AuthenticatorAdapter::new(authenticator),
            activation,
            store,
            config,
        }
    }

    /// Creates a new wallet: registers a credential, derives the account,
    /// funds it best-effort and persists the credential record.
    ///
    /// # Errors
    ///
    /// Fatal only if credential creation, derivation or persistence fails.
    /// Activation failure degrades to a warning on the returned result.
    pub async fn create_wallet(&self) -> Result<SessionResult, PasskeyWalletError> {
        let mut flow = Flow::new("create_wallet");
        match self.run_create(&mut flow).await {
            Ok(result) => {
                flow.advance(FlowState::Done);
                Ok(result)
            }
            Err(error) => {
                flow.fail(&error);
                Err(error)
            }
        }
    }

    /// Authenticates against the wallet previously created on this device.
    ///
    /// # Errors
    ///
    /// [`PasskeyWalletError::NoWalletFound`] if nothing was ever created here
    /// (no authenticator call is made in that case), the adapter's errors if
    /// the assertion fails, and [`PasskeyWalletError::AddressMismatch`] if
    /// the re-derived address disagrees with the stored record.
    pub async fn authenticate(&self) -> Result<SessionResult, PasskeyWalletError> {
        let mut flow = Flow::new("authenticate");
        match self.run_authenticate(&mut flow).await {
            Ok(result) => {
                flow.advance(FlowState::Done);
                Ok(result)
            }
            Err(error) => {
                flow.fail(&error);
                Err(error)
            }
        }
    }

    /// Forgets the wallet on this device by clearing the stored record.
    ///
    /// The platform credential itself is not touched; re-running
    /// [`Self::create_wallet`] registers a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    pub fn forget_device(&self) -> Result<(), PasskeyWalletError> {
        self.store.clear().map_err(Into::into)
    }

    async fn run_create(
        &self,
        flow: &mut Flow,
    ) -> Result<SessionResult, PasskeyWalletError> {
        flow.advance(FlowState::BuildingOptions);
        // Exclude the credential already bound to this device, if any, so the
        // authenticator refuses a duplicate registration.
        let exclude: Vec<String> = self
            .store
            .load()?
            .map(|record| record.credential_id)
            .into_iter()
            .collect();
        let options = CreationOptions::generate(&self.config, &exclude);
        let user_id = options.user.id.clone();

        flow.advance(FlowState::AwaitingAuthenticator);
        let response = self.adapter.create_credential(&options).await?;

        flow.advance(FlowState::DerivingWallet);
        let raw_id = response.raw_id_bytes()?;
        let wallet = derive_wallet(&response.credential_id, &raw_id);

        flow.advance(FlowState::Activating);
        let warning = match &self.activation {
            Some(activation) => {
                if activation.activate(wallet.address()).await {
                    None
                } else {
                    let warning = format!(
                        "account activation failed for {}; the wallet is usable but unfunded",
                        wallet.address()
                    );
                    log::warn!("{warning}");
                    Some(warning)
                }
            }
            None => {
                log::debug!("no activation endpoint configured; skipping");
                None
            }
        };

        flow.advance(FlowState::Persisting);
        let record = StoredCredentialRecord {
            credential_id: response.credential_id.clone(),
            user_id: user_id.clone(),
            account_address: wallet.address().to_owned(),
            created_at: unix_now_secs()?,
        };
        self.store.save(&record)?;

        log::info!("wallet created for account {}", wallet.address());
        Ok(SessionResult {
            token: session_token(&response.credential_id)?,
            account_address: wallet.address().to_owned(),
            user_id,
            message: format!("Wallet created for account {}.", wallet.address()),
            warning,
        })
    }

    async fn run_authenticate(
        &self,
        flow: &mut Flow,
    ) -> Result<SessionResult, PasskeyWalletError> {
        let record = self
            .store
            .load()?
            .ok_or(PasskeyWalletError::NoWalletFound)?;

        flow.advance(FlowState::BuildingOptions);
        let options = AssertionOptions::generate(
            &self.config,
            std::slice::from_ref(&record.credential_id),
        );

        flow.advance(FlowState::AwaitingAuthenticator);
        let response = self.adapter.authenticate(&options).await?;

        flow.advance(FlowState::DerivingWallet);
        // Derive from the freshly returned identifiers, not the stored ones;
        // agreement with the record is what proves the mapping still holds.
        let raw_id = response.raw_id_bytes()?;
        let wallet = derive_wallet(&response.credential_id, &raw_id);

        flow.advance(FlowState::Verifying);
        if wallet.address() != record.account_address {
            return Err(PasskeyWalletError::AddressMismatch {
                stored: record.account_address,
                derived: wallet.address().to_owned(),
            });
        }

        log::info!("authenticated account {}", record.account_address);
        Ok(SessionResult {
            token: session_token(&record.credential_id)?,
            message: format!("Authenticated account {}.", record.account_address),
            account_address: record.account_address,
            user_id: record.user_id,
            warning: None,
        })
    }
}

/// Mints the local session marker: unix-millis hex plus the first characters
/// of the credential id.
fn session_token(credential_id: &str) -> Result<String, PasskeyWalletError> {
    let millis = unix_now_millis()?;
    let fragment: String = credential_id.chars().take(8).collect();
    Ok(format!("{millis:x}.{fragment}"))
}

fn unix_now_millis() -> Result<u128, PasskeyWalletError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .map_err(|err| PasskeyWalletError::Internal {
            message: format!("unable to determine system time: {err}"),
        })
}

fn unix_now_secs() -> Result<u64, PasskeyWalletError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|err| PasskeyWalletError::Internal {
            message: format!("unable to determine system time: {err}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_embeds_the_credential_fragment() {
        let token = session_token("AZk3fQlCredentialId").unwrap();
        let (timestamp, fragment) = token.split_once('.').unwrap();
        assert!(!timestamp.is_empty());
        assert!(u128::from_str_radix(timestamp, 16).is_ok());
        assert_eq!(fragment, "AZk3fQlC");
    }

    #[test]
    fn token_handles_short_credential_ids() {
        let token = session_token("ab").unwrap();
        assert!(token.ends_with(".ab"));
    }
}
