//! SDK types

use bytes::Bytes;
use idena_primitives::{Address, Dna, Epoch, Nonce, H256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction type code of a plain transfer
pub const TRANSFER_TX_TYPE: u16 = 0;

/// Transaction payload: raw bytes or hex text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw bytes
    Bytes(Bytes),
    /// Hex text, with or without `0x`
    Hex(String),
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Payload::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Hex(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Hex(s)
    }
}

/// Parameters of a transaction to forge
///
/// `to` and `amount` are mandatory; everything else is resolved or defaulted
/// while forging. `hash`, `used_fee` and `timestamp` are only filled on
/// records read back from the node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionParameters {
    /// Recipient
    pub to: Address,
    /// Amount in DNA
    pub amount: Dna,
    /// Sender nonce; fetched (current + 1) when absent
    pub nonce: Option<Nonce>,
    /// Network epoch; fetched when absent
    pub epoch: Option<Epoch>,
    /// Transaction type; transfer when absent
    pub tx_type: Option<u16>,
    /// Fee cap in DNA; computed from the fee quote when absent
    pub max_fee: Option<Dna>,
    /// Tips in DNA
    pub tips: Option<Dna>,
    /// Payload
    pub payload: Option<Payload>,
    /// Pre-computed signature
    pub signature: Option<Payload>,
    /// Hash, once submitted
    pub hash: Option<H256>,
    /// Fee actually paid, once mined
    pub used_fee: Option<Dna>,
    /// Block timestamp in seconds, once mined
    pub timestamp: Option<u64>,
}

impl TransactionParameters {
    /// A transfer of `amount` DNA to `to`
    pub fn new(to: Address, amount: Dna) -> Self {
        Self {
            to,
            amount,
            nonce: None,
            epoch: None,
            tx_type: None,
            max_fee: None,
            tips: None,
            payload: None,
            signature: None,
            hash: None,
            used_fee: None,
            timestamp: None,
        }
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the epoch
    pub fn epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Set the transaction type
    pub fn tx_type(mut self, tx_type: u16) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    /// Set the fee cap
    pub fn max_fee(mut self, fee: Dna) -> Self {
        self.max_fee = Some(fee);
        self
    }

    /// Set the tips
    pub fn tips(mut self, tips: Dna) -> Self {
        self.tips = Some(tips);
        self
    }

    /// Set the payload
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attach a pre-computed signature
    pub fn signature(mut self, signature: impl Into<Payload>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// `dna_getBalance` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BalanceInfo {
    /// Last used nonce
    #[serde(default)]
    pub nonce: Nonce,
    /// Liquid balance
    pub balance: Dna,
    /// Stake
    #[serde(default)]
    pub stake: Dna,
}

/// `dna_epoch` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    /// Current epoch
    pub epoch: Epoch,
    /// Next validation ceremony, RFC 3339
    #[serde(default)]
    pub next_validation: Option<String>,
    /// Current ceremony period
    #[serde(default)]
    pub current_period: Option<String>,
}

/// `bcn_transaction` result
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction hash
    pub hash: H256,
    /// Type name, `"send"` for transfers
    #[serde(rename = "type")]
    pub tx_type: String,
    /// Sender
    pub from: Address,
    /// Recipient
    #[serde(default)]
    pub to: Option<Address>,
    /// Amount
    pub amount: Dna,
    /// Tips
    #[serde(default)]
    pub tips: Option<Dna>,
    /// Fee cap
    #[serde(default)]
    pub max_fee: Option<Dna>,
    /// Sender nonce
    pub nonce: Nonce,
    /// Epoch
    pub epoch: Epoch,
    /// Payload hex
    #[serde(default)]
    pub payload: Option<String>,
    /// Containing block, absent while pending
    #[serde(default)]
    pub block_hash: Option<String>,
    /// Fee paid; zero until mined
    #[serde(default)]
    pub used_fee: Option<Dna>,
    /// Block timestamp in seconds
    #[serde(default)]
    pub timestamp: Option<u64>,
}

impl TransactionRecord {
    /// Mined and final: the node charged a positive fee
    pub fn is_mined(&self) -> bool {
        self.used_fee.map(|fee| !fee.is_zero()).unwrap_or(false)
    }

    /// Whether the record is a plain transfer
    pub fn is_transfer(&self) -> bool {
        self.tx_type == "send"
    }

    /// View the record as transaction parameters
    ///
    /// Non-transfer types have no numeric code here and map to `None`.
    pub fn to_parameters(&self) -> TransactionParameters {
        TransactionParameters {
            to: self.to.unwrap_or(Address::ZERO),
            amount: self.amount,
            nonce: Some(self.nonce),
            epoch: Some(self.epoch),
            tx_type: self.is_transfer().then_some(TRANSFER_TX_TYPE),
            max_fee: self.max_fee,
            tips: self.tips,
            payload: self.payload.clone().map(Payload::Hex),
            signature: None,
            hash: Some(self.hash),
            used_fee: self.used_fee,
            timestamp: self.timestamp,
        }
    }
}

/// Invitation issued by an identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Invitee {
    /// Invitation transaction
    #[serde(rename = "TxHash")]
    pub tx_hash: String,
    /// Invited address
    #[serde(rename = "Address")]
    pub address: Address,
}

/// `dna_identity` result
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub address: Address,
    #[serde(default)]
    pub profile_hash: String,
    #[serde(default)]
    pub stake: Dna,
    #[serde(default)]
    pub invites: u32,
    #[serde(default)]
    pub age: u16,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub required_flips: u32,
    #[serde(default)]
    pub available_flips: u32,
    #[serde(default)]
    pub flip_key_word_pairs: Option<Value>,
    #[serde(default)]
    pub made_flips: u32,
    #[serde(default)]
    pub total_qualified_flips: u32,
    #[serde(default)]
    pub total_short_flip_points: f64,
    #[serde(default)]
    pub flips: Option<Vec<String>>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub invitees: Option<Vec<Invitee>>,
    /// Mining penalty, sent as a decimal string
    #[serde(default)]
    pub penalty: Dna,
    #[serde(default)]
    pub last_validation_flags: Option<Value>,
}
