//! A software authenticator backing the platform port in-process.
//!
//! Used by the developer CLI and the test suite. Each credential gets its own
//! Ed25519 key and a raw identifier that stays stable across assertions,
//! which is the property the wallet derivation depends on. The registry can
//! be exported and re-imported so assertions survive process restarts.
//!
//! This is a development harness: keys live in process memory and in the
//! exported registry in the clear. It is not a hardware-backed authenticator.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ciborium::value::Value;
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding;

use super::platform::{
    AssertionRequest, AssertionResult, AuthenticatorPort, CreationRequest,
    CreationResult, PlatformError,
};

/// Authenticator-data flags: user present, user verified, credential data.
const FLAGS_CREATION: u8 = 0x45;
/// Authenticator-data flags: user present, user verified.
const FLAGS_ASSERTION: u8 = 0x05;

#[derive(Clone, Serialize, Deserialize)]
struct CredentialEntry {
    rp_id: String,
    user_handle: Vec<u8>,
    signing_key: Vec<u8>,
    counter: u32,
}

/// In-process software authenticator.
#[derive(Default)]
pub struct SoftwareAuthenticator {
    // Keyed by the credential id string (the encoding of the raw id).
    credentials: Mutex<HashMap<String, CredentialEntry>>,
}

impl SoftwareAuthenticator {
    /// Creates an authenticator with an empty credential registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the credential registry to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned or serialization
    /// fails.
    pub fn export_registry(&self) -> Result<String, PlatformError> {
        let guard = self
            .credentials
            .lock()
            .map_err(|_| PlatformError::Other("registry mutex poisoned".to_string()))?;
        serde_json::to_string_pretty(&*guard)
            .map_err(|err| PlatformError::Other(err.to_string()))
    }

    /// Restores an authenticator from a previously exported registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not parse as a registry.
    pub fn import_registry(json: &str) -> Result<Self, PlatformError> {
        let credentials: HashMap<String, CredentialEntry> = serde_json::from_str(json)
            .map_err(|err| PlatformError::Other(err.to_string()))?;
        Ok(Self {
            credentials: Mutex::new(credentials),
        })
    }
}

#[async_trait]
impl AuthenticatorPort for SoftwareAuthenticator {
    async fn create(
        &self,
        request: CreationRequest,
    ) -> Result<CreationResult, PlatformError> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| PlatformError::Other("registry mutex poisoned".to_string()))?;

        for excluded in &request.excluded_credentials {
            let excluded_id = encoding::encode(excluded);
            if guard
                .get(&excluded_id)
                .is_some_and(|entry| entry.rp_id == request.rp_id)
            {
                return Err(PlatformError::Other(
                    "a credential for this relying party is already registered"
                        .to_string(),
                ));
            }
        }

        let mut raw_id = [0u8; 32];
        OsRng.fill_bytes(&mut raw_id);
        let credential_id = encoding::encode(&raw_id);

        let mut key_seed = [0u8; 32];
        OsRng.fill_bytes(&mut key_seed);

        guard.insert(
            credential_id.clone(),
            CredentialEntry {
                rp_id: request.rp_id.clone(),
                user_handle: request.user_id.clone(),
                signing_key: key_seed.to_vec(),
                counter: 0,
            },
        );

        let client_data_json =
            client_data("webauthn.create", &request.challenge, &request.rp_id);
        let auth_data = authenticator_data(&request.rp_id, FLAGS_CREATION, 0);
        let attestation_object = attestation_object(&auth_data)?;

        Ok(CreationResult {
            credential_id,
            raw_id: raw_id.to_vec(),
            attestation_object,
            client_data_json,
        })
    }

    async fn get(
        &self,
        request: AssertionRequest,
    ) -> Result<AssertionResult, PlatformError> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| PlatformError::Other("registry mutex poisoned".to_string()))?;

        let credential_id = if request.allowed_credentials.is_empty() {
            // Resident-key flow: any credential registered for this rp.
            guard
                .iter()
                .find(|(_, entry)| entry.rp_id == request.rp_id)
                .map(|(id, _)| id.clone())
        } else {
            request
                .allowed_credentials
                .iter()
                .map(|raw| encoding::encode(raw))
                .find(|id| {
                    guard
                        .get(id)
                        .is_some_and(|entry| entry.rp_id == request.rp_id)
                })
        };
        let Some(credential_id) = credential_id else {
            return Err(PlatformError::NoCredential);
        };

        let entry = guard
            .get_mut(&credential_id)
            .ok_or(PlatformError::NoCredential)?;
        entry.counter += 1;

        let key_seed: [u8; 32] = entry.signing_key.as_slice().try_into().map_err(|_| {
            PlatformError::Other("registry holds a malformed signing key".to_string())
        })?;
        let signing_key = SigningKey::from_bytes(&key_seed);

        let client_data_json =
            client_data("webauthn.get", &request.challenge, &request.rp_id);
        let auth_data =
            authenticator_data(&request.rp_id, FLAGS_ASSERTION, entry.counter);

        let mut message =
            Vec::with_capacity(auth_data.len() + Sha256::output_size());
        message.extend_from_slice(&auth_data);
        message.extend_from_slice(&Sha256::digest(&client_data_json));
        let signature = signing_key.sign(&message);

        let raw_id = encoding::decode(&credential_id).map_err(|_| {
            PlatformError::Other("registry holds a malformed credential id".to_string())
        })?;

        Ok(AssertionResult {
            credential_id,
            raw_id,
            authenticator_data: auth_data,
            client_data_json,
            signature: signature.to_bytes().to_vec(),
            user_handle: Some(entry.user_handle.clone()),
        })
    }
}

fn client_data(operation: &str, challenge: &[u8], rp_id: &str) -> Vec<u8> {
    serde_json::json!({
        "type": operation,
        "challenge": encoding::encode(challenge),
        "origin": format!("https://{rp_id}"),
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}

fn authenticator_data(rp_id: &str, flags: u8, counter: u32) -> Vec<u8> {
    let rp_id_hash = Sha256::digest(rp_id.as_bytes());
    let mut data = Vec::with_capacity(rp_id_hash.len() + 5);
    data.extend_from_slice(&rp_id_hash);
    data.push(flags);
    data.extend_from_slice(&counter.to_be_bytes());
    data
}

fn attestation_object(auth_data: &[u8]) -> Result<Vec<u8>, PlatformError> {
    let object = Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Text("none".to_string())),
        (Value::Text("attStmt".to_string()), Value::Map(vec![])),
        (
            Value::Text("authData".to_string()),
            Value::Bytes(auth_data.to_vec()),
        ),
    ]);
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(&object, &mut buffer)
        .map_err(|err| PlatformError::Other(err.to_string()))?;
    Ok(buffer)
}
