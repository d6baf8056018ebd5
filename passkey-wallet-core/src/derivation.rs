//! Deterministic wallet derivation from passkey credential identifiers.
//!
//! The account keypair is never stored anywhere: it is recomputed on demand
//! from the credential's identifiers, so possession of the passkey *is*
//! possession of the account.

use std::fmt;

use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// A signing keypair and its public account address, derived from a passkey
/// credential.
///
/// Lives only for the duration of one flow. The signing key is redacted from
/// `Debug` output and zeroized on drop; it must never be logged or persisted.
pub struct DerivedWallet {
    address: String,
    signing_key: SigningKey,
}

impl DerivedWallet {
    /// The public account address: lowercase hex of the Ed25519 verifying key.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The Ed25519 verifying key backing the account address.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Signs a message with the derived key.
    ///
    /// Signing is delegated to this short-lived object; the secret never
    /// leaves it except through [`Self::secret_key_bytes`].
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// The raw secret key, in a zeroizing container.
    #[must_use]
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for DerivedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedWallet")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Derives the account keypair for a credential.
///
/// The seed is `SHA-256(UTF-8(credential_id) || raw_id)`, used as the full
/// entropy input to the Ed25519 keypair. For a fixed `(credential_id,
/// raw_id)` pair every call returns the identical wallet, on any machine,
/// with no network or disk access.
///
/// The hash is a single unsalted pass with no domain-separation label.
/// Changing that (adding a label, an iterated KDF) would orphan every
/// previously derived address, so the construction is frozen.
#[must_use]
pub fn derive_wallet(credential_id: &str, raw_id: &[u8]) -> DerivedWallet {
    let mut hasher = Sha256::new();
    hasher.update(credential_id.as_bytes());
    hasher.update(raw_id);
    let digest = hasher.finalize();

    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&digest);

    let signing_key = SigningKey::from_bytes(&seed);
    let address = hex::encode(signing_key.verifying_key().as_bytes());

    DerivedWallet {
        address,
        signing_key,
    }
}
