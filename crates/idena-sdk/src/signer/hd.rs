//! Hierarchical deterministic wallet backend

use idena_crypto::{derive_private_key, mnemonic_to_seed, Signature};
use idena_primitives::Address;
use zeroize::Zeroizing;

use super::LocalKey;
use crate::config::SdkConfig;
use crate::SdkError;

/// Default derivation path template; the account index is appended
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/515'/0'/0";

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A BIP32 seed from which one key per account index is derived
///
/// Every call derives its key again and drops it afterwards.
pub struct HdWallet {
    seed: Zeroizing<Vec<u8>>,
    derivation_path: String,
}

impl HdWallet {
    /// Wallet from an English BIP39 phrase and optional passphrase
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, SdkError> {
        let seed = mnemonic_to_seed(phrase, passphrase)?;
        Ok(Self {
            seed: Zeroizing::new(seed.to_vec()),
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
        })
    }

    /// Wallet from a BIP39 phrase, deriving along `config.derivation_path`
    pub fn from_mnemonic_with_config(
        phrase: &str,
        passphrase: &str,
        config: &SdkConfig,
    ) -> Result<Self, SdkError> {
        Ok(Self::from_mnemonic(phrase, passphrase)?
            .with_derivation_path(config.derivation_path.clone()))
    }

    /// Wallet from a raw seed of 16 to 64 bytes
    pub fn from_seed(seed: &[u8]) -> Result<Self, SdkError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(SdkError::InvalidArgument(format!(
                "seed must be 16 to 64 bytes, got {}",
                seed.len()
            )));
        }
        Ok(Self {
            seed: Zeroizing::new(seed.to_vec()),
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
        })
    }

    /// Use another path template, e.g. `m/44'/60'/0'/0`
    pub fn with_derivation_path(mut self, path: impl Into<String>) -> Self {
        self.derivation_path = path.into();
        self
    }

    /// Path template in use
    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    /// Full path for an account index
    pub fn path_for(&self, index: u32) -> Result<String, SdkError> {
        if index >= HARDENED_OFFSET {
            return Err(SdkError::InvalidArgument(format!(
                "account index {} out of range",
                index
            )));
        }
        Ok(format!(
            "{}/{}",
            self.derivation_path.trim_end_matches('/'),
            index
        ))
    }

    /// Derive the key for an account index
    pub fn derive(&self, index: u32) -> Result<LocalKey, SdkError> {
        let path = self.path_for(index)?;
        let private_key = derive_private_key(&self.seed[..], &path)?;
        Ok(LocalKey::from_signing_key(private_key))
    }

    /// Address of account `index`
    pub fn get_address(&self, index: u32) -> Result<Address, SdkError> {
        self.derive(index)?.get_address(0)
    }

    /// Sign with account `index`
    pub fn sign(&self, message: &[u8], index: u32) -> Result<Signature, SdkError> {
        self.derive(index)?.sign(message, 0)
    }
}

impl std::fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdWallet")
            .field("derivation_path", &self.derivation_path)
            .finish_non_exhaustive()
    }
}
