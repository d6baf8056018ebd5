//! The adapter between wire-format challenge options and the platform
//! authenticator primitive.
//!
//! The adapter translates in both directions and maps platform failures onto
//! the crate's error taxonomy. Identifiers and binary payloads are opaque to
//! it; nothing here interprets attestation or assertion contents.

use std::sync::Arc;

use crate::encoding;
use crate::error::PasskeyWalletError;

mod options;
mod platform;
mod software;

pub use options::*;
pub use platform::*;
pub use software::*;

/// Opaque output of the authenticator, re-encoded to wire format.
///
/// Owned transiently by the orchestrator; never persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCredentialResponse {
    /// String identifier of the credential.
    pub credential_id: String,
    /// Binary identifier of the credential, URL-safe base64.
    pub raw_id: String,
    /// Operation-specific payload.
    pub payload: CredentialPayload,
}

/// Operation-specific authenticator payload, URL-safe base64 fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPayload {
    /// Produced by credential creation.
    Attestation {
        /// The authenticator's attestation object.
        attestation_object: String,
        /// The client data the authenticator signed over.
        client_data_json: String,
    },
    /// Produced by credential assertion.
    Assertion {
        /// Authenticator data covered by the signature.
        authenticator_data: String,
        /// The client data the authenticator signed over.
        client_data_json: String,
        /// The assertion signature.
        signature: String,
        /// User handle the credential was registered with, if returned.
        user_handle: Option<String>,
    },
}

impl RawCredentialResponse {
    /// Decodes the raw credential identifier back to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PasskeyWalletError::MalformedEncoding`] if the identifier is
    /// not valid URL-safe base64.
    pub fn raw_id_bytes(&self) -> Result<Vec<u8>, PasskeyWalletError> {
        encoding::decode(&self.raw_id)
    }
}

/// Wraps a platform port with wire translation and error mapping.
pub struct AuthenticatorAdapter {
    port: Arc<dyn AuthenticatorPort>,
}

impl AuthenticatorAdapter {
    /// Creates an adapter over the given platform port.
    #[must_use]
    pub fn new(port: Arc<dyn AuthenticatorPort>) -> Self {
        Self { port }
    }

    /// Runs credential creation.
    ///
    /// Suspends until the user completes a presence gesture or the platform
    /// rejects the operation.
    ///
    /// # Errors
    ///
    /// [`PasskeyWalletError::AuthenticatorUnsupported`] if the platform has
    /// no credential-creation capability,
    /// [`PasskeyWalletError::CredentialCreationFailed`] for every other
    /// platform failure or a non-conforming result, and
    /// [`PasskeyWalletError::MalformedEncoding`] if `options` carry invalid
    /// wire encoding.
    pub async fn create_credential(
        &self,
        options: &CreationOptions,
    ) -> Result<RawCredentialResponse, PasskeyWalletError> {
        let request = CreationRequest {
            rp_id: options.rp.id.clone(),
            rp_name: options.rp.name.clone(),
            challenge: encoding::decode(&options.challenge)?,
            user_id: encoding::decode(&options.user.id)?,
            user_name: options.user.name.clone(),
            user_display_name: options.user.display_name.clone(),
            algorithms: options
                .pub_key_cred_params
                .iter()
                .map(|param| param.alg)
                .collect(),
            require_resident_key: options.authenticator_selection.require_resident_key,
            user_verification: options.authenticator_selection.user_verification,
            attestation: options.attestation,
            excluded_credentials: decode_descriptors(&options.exclude_credentials)?,
            timeout_ms: options.timeout,
        };

        let result = self.port.create(request).await.map_err(|err| match err {
            PlatformError::Unsupported => PasskeyWalletError::AuthenticatorUnsupported,
            other => PasskeyWalletError::CredentialCreationFailed {
                reason: other.to_string(),
            },
        })?;

        if result.credential_id.is_empty() || result.raw_id.is_empty() {
            return Err(PasskeyWalletError::CredentialCreationFailed {
                reason: "platform returned an empty credential identifier".to_string(),
            });
        }

        Ok(RawCredentialResponse {
            credential_id: result.credential_id,
            raw_id: encoding::encode(&result.raw_id),
            payload: CredentialPayload::Attestation {
                attestation_object: encoding::encode(&result.attestation_object),
                client_data_json: encoding::encode(&result.client_data_json),
            },
        })
    }

    /// Runs credential assertion.
    ///
    /// Suspends until the user completes a presence gesture or the platform
    /// rejects the operation.
    ///
    /// # Errors
    ///
    /// [`PasskeyWalletError::AuthenticatorUnsupported`] if the platform has
    /// no assertion capability,
    /// [`PasskeyWalletError::AuthenticationFailed`] for every other platform
    /// failure or a non-conforming result, and
    /// [`PasskeyWalletError::MalformedEncoding`] if `options` carry invalid
    /// wire encoding.
    pub async fn authenticate(
        &self,
        options: &AssertionOptions,
    ) -> Result<RawCredentialResponse, PasskeyWalletError> {
        let request = AssertionRequest {
            rp_id: options.rp_id.clone(),
            challenge: encoding::decode(&options.challenge)?,
            allowed_credentials: decode_descriptors(&options.allow_credentials)?,
            user_verification: options.user_verification,
            timeout_ms: options.timeout,
        };

        let result = self.port.get(request).await.map_err(|err| match err {
            PlatformError::Unsupported => PasskeyWalletError::AuthenticatorUnsupported,
            other => PasskeyWalletError::AuthenticationFailed {
                reason: other.to_string(),
            },
        })?;

        if result.credential_id.is_empty() || result.raw_id.is_empty() {
            return Err(PasskeyWalletError::AuthenticationFailed {
                reason: "platform returned an empty credential identifier".to_string(),
            });
        }

        Ok(RawCredentialResponse {
            credential_id: result.credential_id,
            raw_id: encoding::encode(&result.raw_id),
            payload: CredentialPayload::Assertion {
                authenticator_data: encoding::encode(&result.authenticator_data),
                client_data_json: encoding::encode(&result.client_data_json),
                signature: encoding::encode(&result.signature),
                user_handle: result.user_handle.as_deref().map(encoding::encode),
            },
        })
    }
}

fn decode_descriptors(
    descriptors: &[CredentialDescriptor],
) -> Result<Vec<Vec<u8>>, PasskeyWalletError> {
    descriptors
        .iter()
        .map(|descriptor| encoding::decode(&descriptor.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::config::WalletConfig;
    use crate::Environment;

    use super::*;

    /// Port stub that fails every call with a fixed error.
    struct FailingPort {
        creation_error: fn() -> PlatformError,
    }

    #[async_trait]
    impl AuthenticatorPort for FailingPort {
        async fn create(
            &self,
            _request: CreationRequest,
        ) -> Result<CreationResult, PlatformError> {
            Err((self.creation_error)())
        }

        async fn get(
            &self,
            _request: AssertionRequest,
        ) -> Result<AssertionResult, PlatformError> {
            Err((self.creation_error)())
        }
    }

    fn config() -> WalletConfig {
        WalletConfig::for_environment("example.org", "Example", &Environment::Testnet)
    }

    fn adapter(creation_error: fn() -> PlatformError) -> AuthenticatorAdapter {
        AuthenticatorAdapter::new(std::sync::Arc::new(FailingPort { creation_error }))
    }

    #[tokio::test]
    async fn unsupported_platform_maps_to_unsupported() {
        let adapter = adapter(|| PlatformError::Unsupported);
        let options = CreationOptions::generate(&config(), &[]);
        let err = adapter.create_credential(&options).await.unwrap_err();
        assert!(matches!(err, PasskeyWalletError::AuthenticatorUnsupported));

        let options = AssertionOptions::generate(&config(), &[]);
        let err = adapter.authenticate(&options).await.unwrap_err();
        assert!(matches!(err, PasskeyWalletError::AuthenticatorUnsupported));
    }

    #[tokio::test]
    async fn user_cancellation_maps_per_operation() {
        let adapter = adapter(|| PlatformError::Cancelled);

        let options = CreationOptions::generate(&config(), &[]);
        let err = adapter.create_credential(&options).await.unwrap_err();
        assert!(matches!(
            err,
            PasskeyWalletError::CredentialCreationFailed { .. }
        ));
        assert!(err.is_retryable());

        let options = AssertionOptions::generate(&config(), &[]);
        let err = adapter.authenticate(&options).await.unwrap_err();
        assert!(matches!(err, PasskeyWalletError::AuthenticationFailed { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_credential_maps_to_creation_failure() {
        let adapter = adapter(|| PlatformError::NoCredential);
        let options = CreationOptions::generate(&config(), &[]);
        let err = adapter.create_credential(&options).await.unwrap_err();
        assert!(matches!(
            err,
            PasskeyWalletError::CredentialCreationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn malformed_allow_list_is_rejected_before_the_port() {
        let adapter = adapter(|| PlatformError::Unsupported);
        let mut options = AssertionOptions::generate(&config(), &[]);
        options
            .allow_credentials
            .push(CredentialDescriptor::public_key("not+base64url"));
        let err = adapter.authenticate(&options).await.unwrap_err();
        assert!(matches!(err, PasskeyWalletError::MalformedEncoding { .. }));
    }

    #[tokio::test]
    async fn round_trip_through_the_software_authenticator() {
        let port = std::sync::Arc::new(SoftwareAuthenticator::new());
        let adapter = AuthenticatorAdapter::new(port);

        let options = CreationOptions::generate(&config(), &[]);
        let created = adapter.create_credential(&options).await.unwrap();
        assert_eq!(
            created.credential_id,
            created.raw_id,
            "credential id is the encoding of the raw id"
        );
        assert!(matches!(
            created.payload,
            CredentialPayload::Attestation { .. }
        ));

        let options =
            AssertionOptions::generate(&config(), &[created.credential_id.clone()]);
        let asserted = adapter.authenticate(&options).await.unwrap();
        assert_eq!(asserted.raw_id, created.raw_id);
        assert!(matches!(
            asserted.payload,
            CredentialPayload::Assertion { .. }
        ));
    }
}
