//! RpcClient - node RPC client

use idena_primitives::{Address, Dna, Epoch, Nonce, H256, U256};
use serde_json::Value;

use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{BalanceInfo, EpochInfo, Identity, TransactionRecord};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;
#[cfg(feature = "http")]
use crate::SdkConfig;

/// Gas units charged per payload byte
pub const GAS_PER_BYTE: u64 = 10;

/// Idena node client for RPC communication
pub struct RpcClient {
    transport: Box<dyn Transport>,
}

impl RpcClient {
    /// Create a new client with HTTP transport
    #[cfg(feature = "http")]
    pub fn connect(url: &str) -> Self {
        Self::with_transport(HttpTransport::new(url))
    }

    /// Create an HTTP client from configuration
    #[cfg(feature = "http")]
    pub fn from_config(config: &SdkConfig) -> Self {
        let transport = HttpTransport::new(&config.rpc_url);
        match &config.api_key {
            Some(key) => Self::with_transport(transport.with_api_key(key.clone())),
            None => Self::with_transport(transport),
        }
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self::with_transport(MockTransport::new())
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Helper method to make RPC request and deserialize
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        tracing::debug!(method, "rpc call");
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// Current epoch details
    pub async fn get_epoch_info(&self) -> Result<EpochInfo, SdkError> {
        self.request("dna_epoch", vec![]).await
    }

    /// Current epoch
    pub async fn get_epoch(&self) -> Result<Epoch, SdkError> {
        Ok(self.get_epoch_info().await?.epoch)
    }

    /// Live fee quote per payload byte
    ///
    /// The node quotes a fee per gas in base units; a byte costs
    /// [`GAS_PER_BYTE`] gas.
    pub async fn get_fee_per_byte_quote(&self) -> Result<Dna, SdkError> {
        let raw: Value = self.request("bcn_feePerGas", vec![]).await?;
        let per_gas = parse_base_units(&raw)?;
        per_gas
            .checked_mul(U256::from(GAS_PER_BYTE))
            .map(Dna::from_base_units)
            .ok_or_else(|| SdkError::Serialization(format!("fee quote overflow: {}", raw)))
    }

    // ==================== Account Queries ====================

    /// Nonce, balance and stake of an address
    pub async fn get_nonce_and_balance(&self, address: &Address) -> Result<BalanceInfo, SdkError> {
        self.request("dna_getBalance", vec![Value::String(address.to_hex())])
            .await
    }

    /// Last used nonce of an address
    pub async fn get_nonce(&self, address: &Address) -> Result<Nonce, SdkError> {
        Ok(self.get_nonce_and_balance(address).await?.nonce)
    }

    /// Identity record of an address
    pub async fn get_identity_by_address(&self, address: &Address) -> Result<Identity, SdkError> {
        self.request("dna_identity", vec![Value::String(address.to_hex())])
            .await
    }

    // ==================== Transactions ====================

    /// Send a signed, encoded transaction; returns its hash
    pub async fn submit_raw_transaction(&self, tx: &[u8]) -> Result<H256, SdkError> {
        let hex = format!("0x{}", hex::encode(tx));
        let result: String = self
            .request("bcn_sendRawTx", vec![Value::String(hex)])
            .await?;
        H256::from_hex(&result).map_err(|e| {
            SdkError::Serialization(format!(
                "transaction accepted but node returned malformed hash {:?}: {}",
                result, e
            ))
        })
    }

    /// Fetch a transaction by hash
    pub async fn get_transaction_by_hash(&self, hash: &H256) -> Result<TransactionRecord, SdkError> {
        self.request("bcn_transaction", vec![Value::String(hash.to_hex())])
            .await
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}

/// Parse an amount of base units given as a JSON string or number
///
/// Fractional values are rounded to the nearest base unit.
fn parse_base_units(value: &Value) -> Result<U256, SdkError> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16)
                    .map_err(|e| SdkError::Serialization(format!("{}: {:?}", s, e))),
                None => U256::from_dec_str(s).or_else(|_| {
                    s.parse::<f64>()
                        .map_err(|e| SdkError::Serialization(format!("{}: {}", s, e)))
                        .and_then(round_base_units)
                }),
            }
        }
        Value::Number(n) => match n.as_u64() {
            Some(units) => Ok(U256::from(units)),
            None => n
                .as_f64()
                .ok_or_else(|| SdkError::Serialization(format!("not a base-unit amount: {}", n)))
                .and_then(round_base_units),
        },
        other => Err(SdkError::Serialization(format!(
            "unexpected fee quote: {}",
            other
        ))),
    }
}

fn round_base_units(units: f64) -> Result<U256, SdkError> {
    let rounded = units.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded >= u128::MAX as f64 {
        return Err(SdkError::Serialization(format!(
            "not a base-unit amount: {}",
            units
        )));
    }
    Ok(U256::from(rounded as u128))
}
