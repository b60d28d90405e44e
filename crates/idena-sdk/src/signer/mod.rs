//! Signing backends
//!
//! [`Signer`] is the closed set of key custody options. Each variant derives
//! the address of an account index and signs forged transaction bytes for it.

mod hardware;
mod hd;
mod local;

pub use hardware::{HardwareWallet, DEFAULT_HARDWARE_PATH};
pub use hd::{HdWallet, DEFAULT_DERIVATION_PATH};
pub use local::LocalKey;

use idena_crypto::Signature;
use idena_primitives::Address;

use crate::SdkError;

/// A key custody backend
#[derive(Debug)]
pub enum Signer {
    /// One private key in memory
    Local(LocalKey),
    /// Keys derived from a seed
    HdWallet(HdWallet),
    /// External signing device
    Hardware(HardwareWallet),
}

impl Signer {
    /// Address of account `index`
    pub async fn get_address(&self, index: u32) -> Result<Address, SdkError> {
        match self {
            Signer::Local(key) => key.get_address(index),
            Signer::HdWallet(wallet) => wallet.get_address(index),
            Signer::Hardware(wallet) => wallet.get_address(index).await,
        }
    }

    /// Sign `message` with account `index`
    pub async fn sign(&self, message: &[u8], index: u32) -> Result<Signature, SdkError> {
        match self {
            Signer::Local(key) => key.sign(message, index),
            Signer::HdWallet(wallet) => wallet.sign(message, index),
            Signer::Hardware(wallet) => wallet.sign(message, index).await,
        }
    }

    /// Release held resources; only a device session needs it
    pub async fn close(&self) -> Result<(), SdkError> {
        match self {
            Signer::Local(_) | Signer::HdWallet(_) => Ok(()),
            Signer::Hardware(wallet) => wallet.close().await,
        }
    }
}

impl From<LocalKey> for Signer {
    fn from(key: LocalKey) -> Self {
        Signer::Local(key)
    }
}

impl From<HdWallet> for Signer {
    fn from(wallet: HdWallet) -> Self {
        Signer::HdWallet(wallet)
    }
}

impl From<HardwareWallet> for Signer {
    fn from(wallet: HardwareWallet) -> Self {
        Signer::Hardware(wallet)
    }
}
