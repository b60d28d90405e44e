//! # idena-sdk
//!
//! Client-side transaction signing for the Idena network.
//!
//! ## Features
//!
//! - **Idena**: account facade for transfers, bulk submission and lookups
//! - **Signer**: local key, HD wallet or hardware device behind one API
//! - **TransactionForge**: canonical encoding, fee computation, signing and submission
//! - **Operation**: handle on a submitted transaction with confirmation polling
//! - **RpcClient**: node RPC over HTTP, or a scripted mock for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idena_sdk::{Dna, Idena, LocalKey, RpcClient, SdkConfig, TransactionParameters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = LocalKey::from_private_key_hex(
//!         "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//!     )?;
//!     let idena = Idena::new(key, RpcClient::new_mock(), SdkConfig::default());
//!
//!     // Send 0.001 DNA to ourselves
//!     let me = idena.get_address(0).await?;
//!     let params = TransactionParameters::new(me, Dna::from_dna_str("0.001")?);
//!     let operation = idena.transfer(params, 0).await?;
//!     println!("Submitted: {}", operation.hash());
//!
//!     // Wait for it to be mined
//!     let record = operation.confirmation().await?;
//!     println!("Fee paid: {:?}", record.used_fee);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Hardware Wallet
//!
//! ```rust,no_run
//! use idena_sdk::hardware::TcpConnector;
//! use idena_sdk::{HardwareWallet, Idena, SdkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SdkConfig::load("idena.toml")?;
//!     let device = HardwareWallet::from_config(TcpConnector::new("127.0.0.1:9999"), &config);
//!     let idena = Idena::connect(device, config);
//!
//!     println!("Address: {}", idena.get_address(0).await?);
//!     idena.close().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod client;
pub mod codec;
mod config;
mod error;
mod forge;
pub mod hardware;
mod operation;
pub mod signer;
mod transport;
pub mod types;

// Re-export main types
pub use account::{Idena, OperationRef};
pub use client::{RpcClient, GAS_PER_BYTE};
pub use config::{FeeConfig, PollConfig, SdkConfig};
pub use error::SdkError;
pub use forge::TransactionForge;
pub use operation::{ConfirmationPoller, Operation, PollState};
pub use signer::{HardwareWallet, HdWallet, LocalKey, Signer};
pub use transport::{MockReply, MockTransport, MOCK_IDENTITY_ADDRESS};
pub use types::{BalanceInfo, Payload, TransactionParameters, TransactionRecord};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives for convenience
pub use idena_crypto::Signature;
pub use idena_primitives::{Address, Dna, Epoch, Nonce, H256, U256};
