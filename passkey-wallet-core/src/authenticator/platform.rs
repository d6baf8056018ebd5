//! The platform authenticator primitive, as seen from this crate.
//!
//! Implementations talk to whatever the host platform provides (a browser
//! credential API, an OS passkey service, a software authenticator). The
//! shapes here carry decoded binary fields; wire encoding stays on the
//! adapter side of the boundary.

use async_trait::async_trait;
use thiserror::Error;

use super::options::{AttestationPreference, UserVerification};

/// Failures reported by the platform primitive.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform has no credential capability at all.
    #[error("platform has no authenticator capability")]
    Unsupported,
    /// The user dismissed the gesture prompt.
    #[error("cancelled by the user")]
    Cancelled,
    /// The gesture prompt timed out.
    #[error("gesture timed out")]
    Timeout,
    /// The platform call completed but produced no credential.
    #[error("platform returned no credential")]
    NoCredential,
    /// Any other platform-reported failure.
    #[error("{0}")]
    Other(String),
}

/// Native request shape for credential creation.
#[derive(Debug, Clone)]
pub struct CreationRequest {
    /// Relying-party identifier.
    pub rp_id: String,
    /// Relying-party name.
    pub rp_name: String,
    /// Decoded challenge bytes.
    pub challenge: Vec<u8>,
    /// Decoded user handle.
    pub user_id: Vec<u8>,
    /// Account name for the platform chooser.
    pub user_name: String,
    /// Display name for the platform chooser.
    pub user_display_name: String,
    /// Accepted COSE algorithms, most preferred first.
    pub algorithms: Vec<i32>,
    /// Whether the credential must be discoverable.
    pub require_resident_key: bool,
    /// User-verification policy.
    pub user_verification: UserVerification,
    /// Attestation preference.
    pub attestation: AttestationPreference,
    /// Decoded raw ids the authenticator must refuse to re-register.
    pub excluded_credentials: Vec<Vec<u8>>,
    /// Gesture timeout in milliseconds.
    pub timeout_ms: u32,
}

/// Native result of credential creation.
#[derive(Debug, Clone)]
pub struct CreationResult {
    /// String identifier of the new credential.
    pub credential_id: String,
    /// Binary identifier of the new credential.
    pub raw_id: Vec<u8>,
    /// The authenticator's attestation object (opaque CBOR).
    pub attestation_object: Vec<u8>,
    /// The client data the authenticator signed over.
    pub client_data_json: Vec<u8>,
}

/// Native request shape for credential assertion.
#[derive(Debug, Clone)]
pub struct AssertionRequest {
    /// Relying-party identifier.
    pub rp_id: String,
    /// Decoded challenge bytes.
    pub challenge: Vec<u8>,
    /// Decoded raw ids acceptable for this assertion.
    pub allowed_credentials: Vec<Vec<u8>>,
    /// User-verification policy.
    pub user_verification: UserVerification,
    /// Gesture timeout in milliseconds.
    pub timeout_ms: u32,
}

/// Native result of credential assertion.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// String identifier of the asserted credential.
    pub credential_id: String,
    /// Binary identifier of the asserted credential.
    pub raw_id: Vec<u8>,
    /// Authenticator data covered by the signature (opaque).
    pub authenticator_data: Vec<u8>,
    /// The client data the authenticator signed over.
    pub client_data_json: Vec<u8>,
    /// The assertion signature (opaque).
    pub signature: Vec<u8>,
    /// User handle the credential was registered with, if returned.
    pub user_handle: Option<Vec<u8>>,
}

/// The platform's challenge-response credential primitive.
///
/// Both calls suspend until the user completes a presence gesture or the
/// platform rejects the operation. Implementations own their timeouts.
#[async_trait]
pub trait AuthenticatorPort: Send + Sync {
    /// Creates a credential ("registration").
    async fn create(&self, request: CreationRequest)
        -> Result<CreationResult, PlatformError>;

    /// Asserts an existing credential ("authentication").
    async fn get(&self, request: AssertionRequest)
        -> Result<AssertionResult, PlatformError>;
}
