use thiserror::Error;

use crate::store::StoreError;

/// Error outputs from the passkey wallet flows.
#[derive(Debug, Error)]
pub enum PasskeyWalletError {
    /// The platform has no credential-creation or assertion capability.
    #[error("authenticator_unsupported")]
    AuthenticatorUnsupported,
    /// The platform failed to produce a credential (declined, timed out, or
    /// returned nothing).
    #[error("credential_creation_failed: {reason}")]
    CredentialCreationFailed {
        /// Reason reported by the platform.
        reason: String,
    },
    /// The platform failed to produce an assertion.
    #[error("authentication_failed: {reason}")]
    AuthenticationFailed {
        /// Reason reported by the platform.
        reason: String,
    },
    /// Authentication was attempted but no wallet was ever created on this
    /// device.
    #[error("no_wallet_found")]
    NoWalletFound,
    /// The re-derived account address disagrees with the stored record.
    ///
    /// Signals data corruption or a changed authenticator. Never recovered
    /// from automatically; the stored address is never overwritten.
    #[error("address_mismatch: stored {stored}, derived {derived}")]
    AddressMismatch {
        /// Address recorded at wallet creation.
        stored: String,
        /// Address recomputed from the fresh assertion.
        derived: String,
    },
    /// Input is not valid URL-safe base64.
    #[error("malformed_encoding: {reason}")]
    MalformedEncoding {
        /// What was wrong with the input.
        reason: String,
    },
    /// Failure in the credential record store.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Unexpected internal failure.
    #[error("internal: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl PasskeyWalletError {
    /// Whether re-invoking the same flow from idle can reasonably succeed.
    ///
    /// Only user-interaction failures are retryable; environment, state and
    /// integrity errors require outside action first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CredentialCreationFailed { .. } | Self::AuthenticationFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PasskeyWalletError::CredentialCreationFailed {
            reason: "declined".to_string()
        }
        .is_retryable());
        assert!(PasskeyWalletError::AuthenticationFailed {
            reason: "timeout".to_string()
        }
        .is_retryable());
        assert!(!PasskeyWalletError::AuthenticatorUnsupported.is_retryable());
        assert!(!PasskeyWalletError::NoWalletFound.is_retryable());
        assert!(!PasskeyWalletError::AddressMismatch {
            stored: "a".to_string(),
            derived: "b".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn display_is_snake_case_tagged() {
        let err = PasskeyWalletError::NoWalletFound;
        assert_eq!(format!("{err}"), "no_wallet_found");
        let err = PasskeyWalletError::MalformedEncoding {
            reason: "empty input".to_string(),
        };
        assert!(format!("{err}").starts_with("malformed_encoding:"));
    }
}
