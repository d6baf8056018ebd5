//! Wire-format challenge options handed to the authenticator boundary.
//!
//! Options are generated fresh per operation with a random challenge and are
//! never reused. Binary fields travel URL-safe base64 encoded, field names
//! follow the protocol's camelCase JSON shape.

use rand::rngs::OsRng;
use rand::RngCore as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::encoding;

/// Byte length of the per-operation random challenge.
const CHALLENGE_LEN: usize = 32;

/// The logical application identity a credential is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Relying-party identifier (a domain).
    pub id: String,
    /// Human-readable relying-party name.
    pub name: String,
}

/// The user entity registered with a new credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque user handle, URL-safe base64.
    pub id: String,
    /// Account name shown by the platform chooser.
    pub name: String,
    /// Display name shown by the platform chooser.
    pub display_name: String,
}

/// One accepted credential algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialParameter {
    /// Always `public-key`.
    #[serde(rename = "type")]
    pub kind: String,
    /// COSE algorithm identifier (Ed25519 is -8).
    pub alg: i32,
}

impl CredentialParameter {
    /// A `public-key` parameter for the given COSE algorithm.
    #[must_use]
    pub fn public_key(alg: i32) -> Self {
        Self {
            kind: "public-key".to_string(),
            alg,
        }
    }
}

/// How much attestation the relying party wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    /// No attestation statement requested.
    None,
    /// Attestation may be anonymized by the platform.
    Indirect,
    /// Full attestation statement requested.
    Direct,
}

/// User-verification policy for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    /// The gesture must verify the user (biometric or device credential).
    Required,
    /// Verification preferred but presence alone is accepted.
    Preferred,
    /// Presence alone is requested.
    Discouraged,
}

/// Authenticator-selection policy for credential creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    /// Restricts creation to the platform (built-in) authenticator.
    pub authenticator_attachment: String,
    /// Whether the credential must be discoverable on the authenticator.
    pub require_resident_key: bool,
    /// User-verification policy.
    pub user_verification: UserVerification,
}

/// Reference to an existing credential, for allow/exclude lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    /// Always `public-key`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Credential identifier, URL-safe base64.
    pub id: String,
}

impl CredentialDescriptor {
    /// A `public-key` descriptor for the given credential id.
    #[must_use]
    pub fn public_key(id: impl Into<String>) -> Self {
        Self {
            kind: "public-key".to_string(),
            id: id.into(),
        }
    }
}

/// Challenge options for credential creation ("registration").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    /// Relying-party identity.
    pub rp: RelyingParty,
    /// User entity with a freshly minted random handle.
    pub user: UserEntity,
    /// Fresh random challenge, URL-safe base64.
    pub challenge: String,
    /// Accepted algorithms, most preferred first.
    pub pub_key_cred_params: Vec<CredentialParameter>,
    /// Authenticator-selection policy.
    pub authenticator_selection: AuthenticatorSelection,
    /// Attestation preference.
    pub attestation: AttestationPreference,
    /// Credentials the authenticator must refuse to re-register.
    pub exclude_credentials: Vec<CredentialDescriptor>,
    /// Gesture timeout in milliseconds.
    pub timeout: u32,
}

impl CreationOptions {
    /// Builds fresh creation options with a random challenge and a random
    /// user handle.
    #[must_use]
    pub fn generate(config: &WalletConfig, exclude: &[String]) -> Self {
        let user_handle = *Uuid::new_v4().as_bytes();
        let user_id = encoding::encode(&user_handle);
        let short = &user_id[..8.min(user_id.len())];

        Self {
            rp: RelyingParty {
                id: config.rp_id.clone(),
                name: config.rp_name.clone(),
            },
            user: UserEntity {
                name: format!("user-{short}"),
                display_name: format!("{} user {short}", config.rp_name),
                id: user_id,
            },
            challenge: fresh_challenge(),
            pub_key_cred_params: config
                .algorithms
                .iter()
                .map(|alg| CredentialParameter::public_key(*alg))
                .collect(),
            authenticator_selection: AuthenticatorSelection {
                authenticator_attachment: "platform".to_string(),
                require_resident_key: true,
                user_verification: config.user_verification,
            },
            attestation: AttestationPreference::None,
            exclude_credentials: exclude
                .iter()
                .map(CredentialDescriptor::public_key)
                .collect(),
            timeout: config.timeout_ms,
        }
    }
}

/// Challenge options for credential assertion ("authentication").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionOptions {
    /// Relying-party identifier.
    pub rp_id: String,
    /// Fresh random challenge, URL-safe base64.
    pub challenge: String,
    /// Credentials acceptable for this assertion.
    pub allow_credentials: Vec<CredentialDescriptor>,
    /// User-verification policy.
    pub user_verification: UserVerification,
    /// Gesture timeout in milliseconds.
    pub timeout: u32,
}

impl AssertionOptions {
    /// Builds fresh assertion options restricted to the given credentials.
    #[must_use]
    pub fn generate(config: &WalletConfig, allowed: &[String]) -> Self {
        Self {
            rp_id: config.rp_id.clone(),
            challenge: fresh_challenge(),
            allow_credentials: allowed
                .iter()
                .map(CredentialDescriptor::public_key)
                .collect(),
            user_verification: config.user_verification,
            timeout: config.timeout_ms,
        }
    }
}

fn fresh_challenge() -> String {
    let mut challenge = [0u8; CHALLENGE_LEN];
    OsRng.fill_bytes(&mut challenge);
    encoding::encode(&challenge)
}

#[cfg(test)]
mod tests {
    use crate::Environment;

    use super::*;

    fn config() -> WalletConfig {
        WalletConfig::for_environment("example.org", "Example", &Environment::Testnet)
    }

    #[test]
    fn creation_options_are_fresh_per_call() {
        let first = CreationOptions::generate(&config(), &[]);
        let second = CreationOptions::generate(&config(), &[]);
        assert_ne!(first.challenge, second.challenge);
        assert_ne!(first.user.id, second.user.id);
    }

    #[test]
    fn creation_options_carry_config_policy() {
        let options =
            CreationOptions::generate(&config(), &["Y3JlZC1pZA".to_string()]);
        assert_eq!(options.rp.id, "example.org");
        assert_eq!(options.authenticator_selection.authenticator_attachment, "platform");
        assert_eq!(options.exclude_credentials.len(), 1);
        assert_eq!(options.exclude_credentials[0].id, "Y3JlZC1pZA");
        assert!(options
            .pub_key_cred_params
            .iter()
            .any(|param| param.alg == -8));
    }

    #[test]
    fn assertion_options_restrict_to_allowed_credentials() {
        let options =
            AssertionOptions::generate(&config(), &["Y3JlZC1pZA".to_string()]);
        assert_eq!(options.rp_id, "example.org");
        assert_eq!(options.allow_credentials.len(), 1);
        assert_eq!(options.allow_credentials[0].kind, "public-key");
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let options = CreationOptions::generate(&config(), &[]);
        let json = serde_json::to_value(&options).unwrap();
        assert!(json.get("pubKeyCredParams").is_some());
        assert!(json.get("authenticatorSelection").is_some());
        assert!(json.get("excludeCredentials").is_some());
        assert!(json["user"].get("displayName").is_some());
        assert_eq!(json["pubKeyCredParams"][0]["type"], "public-key");

        let assertion = AssertionOptions::generate(&config(), &[]);
        let json = serde_json::to_value(&assertion).unwrap();
        assert!(json.get("rpId").is_some());
        assert!(json.get("allowCredentials").is_some());
        assert!(json.get("userVerification").is_some());
    }

    #[test]
    fn challenge_is_decodable_and_32_bytes() {
        let options = CreationOptions::generate(&config(), &[]);
        let challenge = crate::encoding::decode(&options.challenge).unwrap();
        assert_eq!(challenge.len(), CHALLENGE_LEN);
    }
}
