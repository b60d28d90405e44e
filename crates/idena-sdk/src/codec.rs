//! Transaction codec
//!
//! Payload normalization, fee arithmetic and the canonical field encoding.
//! [`resolve_defaults`] is the only function here that touches the network.

use idena_crypto::Signature;
use idena_primitives::{Address, Dna, Epoch, Nonce};
use idena_rlp::RlpItem;

use crate::client::RpcClient;
use crate::config::FeeConfig;
use crate::signer::Signer;
use crate::types::{Payload, TransactionParameters, TRANSFER_TX_TYPE};
use crate::SdkError;

/// Assumed size in bytes of a transaction without payload
pub const AVERAGE_TX_SIZE: u64 = 200;

/// Floor of the fallback fee per byte: 1e-16 DNA
const MIN_FALLBACK_FEE_PER_BYTE: u64 = 100;

/// Numerator of the fallback fee per byte: 0.1 DNA
const FALLBACK_FEE_NUMERATOR: u64 = 100_000_000_000_000_000;

/// Render a payload as `0x`-prefixed hex
///
/// Bytes become lowercase hex, text keeps its digits behind a single `0x`,
/// and a missing payload becomes `"0x"`. Applying it to its own output is a
/// no-op.
pub fn normalize_payload(payload: Option<&Payload>) -> String {
    match payload {
        Some(Payload::Bytes(bytes)) => format!("0x{}", hex::encode(bytes)),
        Some(Payload::Hex(text)) => format!("0x{}", text.strip_prefix("0x").unwrap_or(text)),
        None => "0x".to_string(),
    }
}

/// Maximum fee for a payload of `payload_len` bytes
///
/// `fee_per_byte * (AVERAGE_TX_SIZE + payload_len)`, in base units.
pub fn compute_fee(payload_len: usize, fee_per_byte: Dna) -> Result<Dna, SdkError> {
    let bytes = AVERAGE_TX_SIZE
        .checked_add(payload_len as u64)
        .ok_or_else(|| SdkError::InvalidArgument("payload too large".to_string()))?;
    fee_per_byte
        .checked_mul(bytes)
        .ok_or_else(|| SdkError::InvalidArgument("fee overflows".to_string()))
}

/// Last-resort fee per byte: `max(1e-16, 0.1 / network_size)` DNA
pub fn fallback_fee_per_byte(network_size: u64) -> Dna {
    let units = FALLBACK_FEE_NUMERATOR
        .checked_div(network_size)
        .unwrap_or(0)
        .max(MIN_FALLBACK_FEE_PER_BYTE);
    Dna::from_base_units(units)
}

/// Canonical encoding of an ordered field list
pub fn encode(fields: &[RlpItem]) -> Vec<u8> {
    idena_rlp::encode_list(fields)
}

/// A transaction with every field resolved, ready to encode
#[derive(Debug, Clone, PartialEq)]
pub struct ForgedTransaction {
    /// Sender nonce
    pub nonce: Nonce,
    /// Network epoch
    pub epoch: Epoch,
    /// Transaction type
    pub tx_type: u16,
    /// Recipient
    pub to: Address,
    /// Amount
    pub amount: Dna,
    /// Fee cap
    pub max_fee: Dna,
    /// Tips
    pub tips: Dna,
    /// Normalized payload hex
    pub payload: String,
    /// Normalized hex of a signature supplied with the parameters
    pub signature: Option<String>,
}

impl ForgedTransaction {
    /// Take fully specified parameters as they are
    ///
    /// Fails with [`SdkError::InvalidArgument`] when nonce, epoch or max fee
    /// is still missing; see [`resolve_defaults`] to fill them in.
    pub fn from_parameters(params: &TransactionParameters) -> Result<Self, SdkError> {
        let missing = |field: &str| SdkError::InvalidArgument(format!("{} is not resolved", field));
        let forged = Self {
            nonce: params.nonce.ok_or_else(|| missing("nonce"))?,
            epoch: params.epoch.ok_or_else(|| missing("epoch"))?,
            tx_type: params.tx_type.unwrap_or(TRANSFER_TX_TYPE),
            to: params.to,
            amount: params.amount,
            max_fee: params.max_fee.ok_or_else(|| missing("max fee"))?,
            tips: params.tips.unwrap_or(Dna::ZERO),
            payload: normalize_payload(params.payload.as_ref()),
            signature: params
                .signature
                .as_ref()
                .map(|sig| normalize_payload(Some(sig))),
        };
        forged.payload_bytes()?;
        Ok(forged)
    }

    /// Decoded payload bytes
    pub fn payload_bytes(&self) -> Result<Vec<u8>, SdkError> {
        match RlpItem::text(&self.payload)? {
            RlpItem::Bytes(bytes) => Ok(bytes),
            _ => Ok(Vec::new()),
        }
    }

    /// Ordered field list; the signature slot is omitted when there is none
    pub fn fields(&self, signature: Option<&Signature>) -> Result<Vec<RlpItem>, SdkError> {
        let mut fields = vec![
            RlpItem::uint(u64::from(self.nonce)),
            RlpItem::uint(u64::from(self.epoch)),
            RlpItem::uint(u64::from(self.tx_type)),
            RlpItem::bytes(self.to.as_bytes().to_vec()),
            RlpItem::uint(self.amount.base_units()),
            RlpItem::uint(self.max_fee.base_units()),
            RlpItem::uint(self.tips.base_units()),
            RlpItem::text(&self.payload)?,
        ];
        match (signature, &self.signature) {
            (Some(sig), _) => fields.push(RlpItem::bytes(sig.to_bytes().to_vec())),
            (None, Some(explicit)) => fields.push(RlpItem::text(explicit)?),
            (None, None) => {}
        }
        Ok(fields)
    }

    /// Encode, appending `signature` or else any signature given with the parameters
    pub fn forge(&self, signature: Option<&Signature>) -> Result<Vec<u8>, SdkError> {
        Ok(encode(&self.fields(signature)?))
    }
}

/// Fill in whatever the caller left out
///
/// A missing nonce becomes the signer address' current nonce + 1, a missing
/// epoch the current network epoch; each costs exactly one lookup, and a
/// failed lookup is [`SdkError::NetworkUnavailable`]. A missing max fee is
/// computed from the live fee quote, or from the fallback formula when the
/// node does not serve one or serves one that does not parse.
pub async fn resolve_defaults(
    params: &TransactionParameters,
    signer: &Signer,
    index: u32,
    client: &RpcClient,
    fee: &FeeConfig,
) -> Result<ForgedTransaction, SdkError> {
    let mut resolved = params.clone();

    if resolved.nonce.is_none() {
        let address = signer.get_address(index).await?;
        let current = client
            .get_nonce(&address)
            .await
            .map_err(SdkError::into_network)?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| SdkError::InvalidArgument("nonce overflows".to_string()))?;
        resolved.nonce = Some(next);
    }

    if resolved.epoch.is_none() {
        let epoch = client.get_epoch().await.map_err(SdkError::into_network)?;
        resolved.epoch = Some(epoch);
    }

    if resolved.max_fee.is_none() {
        let payload = RlpItem::text(&normalize_payload(resolved.payload.as_ref()))?;
        let payload_len = payload.as_bytes().map_or(0, <[u8]>::len);
        let fee_per_byte = fee_per_byte(client, fee).await?;
        resolved.max_fee = Some(compute_fee(payload_len, fee_per_byte)?);
    }

    ForgedTransaction::from_parameters(&resolved)
}

async fn fee_per_byte(client: &RpcClient, fee: &FeeConfig) -> Result<Dna, SdkError> {
    match client.get_fee_per_byte_quote().await {
        Ok(quote) => Ok(quote),
        Err(
            err @ (SdkError::Rpc { .. }
            | SdkError::UnknownRpcError { .. }
            | SdkError::Serialization(_)),
        ) => {
            let fallback = fallback_fee_per_byte(fee.assumed_network_size);
            tracing::warn!(error = %err, %fallback, "no live fee quote, using fallback");
            Ok(fallback)
        }
        Err(err) => Err(err.into_network()),
    }
}
