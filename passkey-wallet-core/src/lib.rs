//! Passkey-derived blockchain wallets.
//!
//! A platform authenticator (biometric or device credential) is used to
//! deterministically derive an Ed25519 signing keypair, which creates and
//! later re-derives the same account. No private key is ever stored: the
//! credential's identifiers are hashed into the keypair seed on every
//! operation, so re-authentication always reconstructs the exact same
//! account address.
//!
//! The [`PasskeyWallet`] orchestrator is constructed from three injected
//! collaborators: an authenticator port, an optional activation port and a
//! credential store. See the module docs for each boundary.

use strum::EnumString;

/// Network environment the wallet operates against.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Test network; derived accounts are funded through the faucet.
    Testnet,
    /// Main network; no automatic funding.
    Mainnet,
}

pub mod activation;
pub mod authenticator;
pub mod config;
pub mod derivation;
pub mod encoding;
pub mod logger;
pub mod store;

mod error;
pub use error::*;

mod wallet;
pub use wallet::*;
