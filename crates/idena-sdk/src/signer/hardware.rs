//! Hardware wallet backend

use idena_crypto::Signature;
use idena_primitives::Address;
use tokio::sync::Mutex;

use crate::hardware::apdu::{
    build_get_address_command, build_sign_command, decode_address_response,
    decode_signature_response, strip_status_word,
};
use crate::config::SdkConfig;
use crate::hardware::{ApduTransport, DeviceConnector};
use crate::SdkError;

/// Default device path prefix; the account index is appended
pub const DEFAULT_HARDWARE_PATH: &str = "44'/515'/0'/0";

/// A signing device reached through a [`DeviceConnector`]
///
/// The session opens on first use and is held until [`HardwareWallet::close`].
/// Requests are serialized on it.
pub struct HardwareWallet {
    connector: Box<dyn DeviceConnector>,
    session: Mutex<Option<Box<dyn ApduTransport>>>,
    path_prefix: String,
}

impl HardwareWallet {
    /// Wallet using `connector` to find its device
    pub fn new(connector: impl DeviceConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            session: Mutex::new(None),
            path_prefix: DEFAULT_HARDWARE_PATH.to_string(),
        }
    }

    /// Wallet using `config.hardware_path` as its path prefix
    pub fn from_config(connector: impl DeviceConnector + 'static, config: &SdkConfig) -> Self {
        Self::new(connector).with_path_prefix(config.hardware_path.clone())
    }

    /// Use another path prefix
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// Device path for an account index
    pub fn path_for(&self, index: u32) -> String {
        format!("{}/{}", self.path_prefix.trim_end_matches('/'), index)
    }

    /// Whether a session is currently open
    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Open the session now instead of on first use
    pub async fn open(&self) -> Result<(), SdkError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(self.connector.open().await?);
            tracing::debug!("device session opened");
        }
        Ok(())
    }

    /// Send a command and return the response without its status word
    ///
    /// A transport failure drops the session; the next call opens a new one.
    pub async fn exchange(&self, command: &[u8]) -> Result<Vec<u8>, SdkError> {
        let mut guard = self.session.lock().await;
        let mut session = match guard.take() {
            Some(session) => session,
            None => {
                let session = self.connector.open().await?;
                tracing::debug!("device session opened");
                session
            }
        };

        tracing::debug!(command = %hex::encode(command), "apdu exchange");
        match session.exchange(command).await {
            Ok(response) => {
                *guard = Some(session);
                Ok(strip_status_word(&response).to_vec())
            }
            Err(err) => {
                tracing::warn!(error = %err, "apdu exchange failed, dropping device session");
                if let Err(close_err) = session.close().await {
                    tracing::debug!(error = %close_err, "closing failed session");
                }
                Err(err)
            }
        }
    }

    /// Address reported by the device for account `index`
    pub async fn get_address(&self, index: u32) -> Result<Address, SdkError> {
        let command = build_get_address_command(&self.path_for(index))?;
        let payload = self.exchange(&command).await?;
        decode_address_response(&payload)
    }

    /// Have the device sign `message` with account `index`
    pub async fn sign(&self, message: &[u8], index: u32) -> Result<Signature, SdkError> {
        let command = build_sign_command(&self.path_for(index), message)?;
        let payload = self.exchange(&command).await?;
        decode_signature_response(&payload)
    }

    /// Close the session; a no-op when none is open
    pub async fn close(&self) -> Result<(), SdkError> {
        if let Some(mut session) = self.session.lock().await.take() {
            session.close().await?;
            tracing::debug!("device session closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for HardwareWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareWallet")
            .field("path_prefix", &self.path_prefix)
            .finish_non_exhaustive()
    }
}
