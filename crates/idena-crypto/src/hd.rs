//! BIP32/BIP39 hierarchical key derivation

use bip32::{DerivationPath, Language, Mnemonic, XPrv};
use zeroize::Zeroizing;

use crate::{CryptoError, PrivateKey};

/// Length of a BIP39 seed
pub const SEED_LEN: usize = 64;

/// Turn an English BIP39 phrase into its 64-byte seed
pub fn mnemonic_to_seed(
    phrase: &str,
    passphrase: &str,
) -> Result<Zeroizing<[u8; SEED_LEN]>, CryptoError> {
    let mnemonic = Mnemonic::new(phrase.trim(), Language::English)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    let seed = mnemonic.to_seed(passphrase);
    Ok(Zeroizing::new(*seed.as_bytes()))
}

/// Derive the child private key at `path` (e.g. `m/44'/515'/0'/0/3`) from a seed
pub fn derive_private_key(seed: &[u8], path: &str) -> Result<PrivateKey, CryptoError> {
    let path: DerivationPath = path
        .parse()
        .map_err(|e: bip32::Error| CryptoError::Derivation(format!("{}: {}", path, e)))?;
    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| CryptoError::Derivation(e.to_string()))?;
    Ok(xprv.private_key().clone())
}
