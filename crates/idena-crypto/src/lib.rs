//! # idena-crypto
//!
//! Cryptographic primitives for the Idena transaction SDK.
//!
//! - Keccak-256 hashing
//! - ECDSA signing/verification (secp256k1) with a canonical 65-byte signature
//! - Public key recovery
//! - Address derivation
//! - BIP32/BIP39 hierarchical key derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod hd;
mod signature;

pub use error::CryptoError;
pub use hash::keccak256;
pub use hd::{derive_private_key, mnemonic_to_seed, SEED_LEN};
pub use signature::{
    public_key_to_address, recover_public_key, sign, verify, PrivateKey, PublicKey, Signature,
    SIGNATURE_LEN,
};
