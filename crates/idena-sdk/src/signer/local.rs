//! Single private key backend

use idena_crypto::{keccak256, public_key_to_address, sign, PrivateKey, PublicKey, Signature};
use idena_primitives::Address;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::SdkError;

/// One secp256k1 key held in memory
///
/// Note: Clone is intentionally not implemented to prevent accidental key duplication.
pub struct LocalKey {
    private_key: PrivateKey,
    address: Address,
}

impl LocalKey {
    /// Generate a fresh random key
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Create a key from 32 raw bytes
    pub fn from_private_key(key: &[u8; 32]) -> Result<Self, SdkError> {
        let private_key = SigningKey::from_slice(key)
            .map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_signing_key(private_key))
    }

    /// Create a key from hex, with or without `0x`
    pub fn from_private_key_hex(hex: &str) -> Result<Self, SdkError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut bytes = hex::decode(hex)
            .map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        if bytes.len() != 32 {
            let len = bytes.len();
            bytes.zeroize();
            return Err(SdkError::InvalidPrivateKey(format!(
                "Expected 32 bytes, got {}",
                len
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        bytes.zeroize();

        let result = Self::from_private_key(&key);
        key.zeroize();
        result
    }

    pub(crate) fn from_signing_key(private_key: PrivateKey) -> Self {
        let address = public_key_to_address(private_key.verifying_key());
        Self {
            private_key,
            address,
        }
    }

    /// Address of this key
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Public key
    pub fn public_key(&self) -> &PublicKey {
        self.private_key.verifying_key()
    }

    /// Sign `keccak256(message)`
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, SdkError> {
        let digest = keccak256(message);
        Ok(sign(&digest, &self.private_key)?)
    }

    /// Address for `index`, which must be 0
    pub fn get_address(&self, index: u32) -> Result<Address, SdkError> {
        check_index(index)?;
        Ok(self.address)
    }

    /// Sign for `index`, which must be 0
    pub fn sign(&self, message: &[u8], index: u32) -> Result<Signature, SdkError> {
        check_index(index)?;
        self.sign_message(message)
    }
}

fn check_index(index: u32) -> Result<(), SdkError> {
    if index != 0 {
        return Err(SdkError::InvalidArgument(format!(
            "a single key has only account 0, got {}",
            index
        )));
    }
    Ok(())
}

impl std::fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
