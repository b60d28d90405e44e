//! Device transport traits and an in-memory device

use async_trait::async_trait;
use idena_crypto::{derive_private_key, keccak256, sign, SEED_LEN};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

use super::apdu::{decode_bip32_path, CLA, INS_GET_ADDRESS, INS_SIGN, SW_OK};
use crate::SdkError;

/// An open session with a signing device
#[async_trait]
pub trait ApduTransport: Send {
    /// Send one command; returns the raw response including the status word
    async fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, SdkError>;

    /// Release the session
    async fn close(&mut self) -> Result<(), SdkError>;
}

/// Finds a device and opens a session with it
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Discover and open; [`SdkError::DeviceUnavailable`] when there is none
    async fn open(&self) -> Result<Box<dyn ApduTransport>, SdkError>;
}

/// Status word returned when the Idena app is not running
pub const SW_APP_NOT_OPEN: [u8; 2] = [0x6e, 0x00];
const SW_INS_NOT_SUPPORTED: [u8; 2] = [0x6d, 0x00];
const SW_WRONG_DATA: [u8; 2] = [0x6a, 0x80];

struct MockDeviceState {
    seed: Zeroizing<Vec<u8>>,
    app_open: bool,
    queued: VecDeque<Vec<u8>>,
    commands: Vec<Vec<u8>>,
    opened: usize,
    closed: usize,
}

/// In-memory device running an Idena app
///
/// Keys are derived from a seed at the path carried by each command, so its
/// addresses match an [`crate::HdWallet`] built from the same seed. Queued raw
/// responses take precedence over the emulated app. Clones share state.
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockDevice {
    /// Device holding `seed`, app open
    pub fn new(seed: &[u8]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState {
                seed: Zeroizing::new(seed.to_vec()),
                app_open: true,
                queued: VecDeque::new(),
                commands: Vec::new(),
                opened: 0,
                closed: 0,
            })),
        }
    }

    /// Device with a fixed test seed
    pub fn with_test_seed() -> Self {
        Self::new(&[0x42; SEED_LEN])
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockDeviceState> {
        // Mutex poisoning indicates a panicked test thread
        self.state.lock().expect("MockDevice mutex poisoned")
    }

    /// Open or quit the Idena app
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_app_open(&self, open: bool) {
        self.state().app_open = open;
    }

    /// Queue a raw response for the next exchange
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn push_response(&self, response: Vec<u8>) {
        self.state().queued.push_back(response);
    }

    /// Every command received, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.state().commands.clone()
    }

    /// Sessions opened so far
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn open_count(&self) -> usize {
        self.state().opened
    }

    /// Sessions closed so far
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn close_count(&self) -> usize {
        self.state().closed
    }

    fn respond(state: &MockDeviceState, command: &[u8]) -> Vec<u8> {
        if !state.app_open {
            return SW_APP_NOT_OPEN.to_vec();
        }
        if command.len() < 6 || command[0] != CLA {
            return SW_WRONG_DATA.to_vec();
        }
        if command[1] != INS_GET_ADDRESS && command[1] != INS_SIGN {
            return SW_INS_NOT_SUPPORTED.to_vec();
        }
        let path_end = 6 + 4 * command[5] as usize;
        let (Some(path), Some(data)) = (command.get(6..path_end), command.get(path_end..)) else {
            return SW_WRONG_DATA.to_vec();
        };
        let key = match decode_bip32_path(path)
            .ok()
            .and_then(|path| derive_private_key(&state.seed[..], &format!("m/{}", path)).ok())
        {
            Some(key) => key,
            None => return SW_WRONG_DATA.to_vec(),
        };

        let mut response = match command[1] {
            INS_SIGN => match sign(&keccak256(data), &key) {
                Ok(signature) => signature.to_bytes().to_vec(),
                Err(_) => return SW_WRONG_DATA.to_vec(),
            },
            _ => {
                let pubkey = key.verifying_key().to_encoded_point(false);
                let address = idena_crypto::public_key_to_address(key.verifying_key());
                let text = address.to_hex();
                let text = text.trim_start_matches("0x");

                let mut out = vec![pubkey.as_bytes().len() as u8];
                out.extend_from_slice(pubkey.as_bytes());
                out.push(text.len() as u8);
                out.extend_from_slice(text.as_bytes());
                out
            }
        };
        response.extend_from_slice(&SW_OK);
        response
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice").finish_non_exhaustive()
    }
}

#[async_trait]
impl ApduTransport for MockDevice {
    async fn exchange(&mut self, command: &[u8]) -> Result<Vec<u8>, SdkError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SdkError::DeviceUnavailable("MockDevice mutex poisoned".to_string()))?;
        state.commands.push(command.to_vec());
        if let Some(queued) = state.queued.pop_front() {
            return Ok(queued);
        }
        Ok(Self::respond(&state, command))
    }

    async fn close(&mut self) -> Result<(), SdkError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SdkError::DeviceUnavailable("MockDevice mutex poisoned".to_string()))?;
        state.closed += 1;
        Ok(())
    }
}

/// Connector handing out sessions on a [`MockDevice`]
#[derive(Debug, Clone)]
pub struct MockConnector {
    device: Option<MockDevice>,
}

impl MockConnector {
    /// Connector that finds `device`
    pub fn new(device: MockDevice) -> Self {
        Self {
            device: Some(device),
        }
    }

    /// Connector that finds nothing
    pub fn disconnected() -> Self {
        Self { device: None }
    }
}

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn open(&self) -> Result<Box<dyn ApduTransport>, SdkError> {
        let device = self
            .device
            .clone()
            .ok_or_else(|| SdkError::DeviceUnavailable("no compatible device found".to_string()))?;
        device
            .state
            .lock()
            .map_err(|_| SdkError::DeviceUnavailable("MockDevice mutex poisoned".to_string()))?
            .opened += 1;
        Ok(Box::new(device))
    }
}
