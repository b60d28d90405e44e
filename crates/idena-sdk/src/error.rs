//! SDK error types

use idena_primitives::H256;
use thiserror::Error;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Node unreachable, response undecodable, or a required lookup failed
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The node answered with an error object
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message, verbatim
        message: String,
    },

    /// The node answered with neither `result` nor `error`
    #[error("unknown RPC error: {method} returned neither result nor error")]
    UnknownRpcError {
        /// Method that produced the empty response
        method: String,
    },

    /// The node refused the signed transaction
    #[error("{0}")]
    SubmissionRejected(String),

    /// The attempt budget ran out before the transaction was mined
    #[error("confirmation timeout: {hash} not mined after {attempts} attempts")]
    ConfirmationTimeout {
        /// Transaction hash
        hash: H256,
        /// Number of polls made
        attempts: u32,
    },

    /// No compatible hardware device, or the user declined the selection
    #[error("hardware device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device answered with an empty payload
    #[error("open the Idena application on the device")]
    ApplicationNotOpen,

    /// The device answered with a payload that does not parse
    #[error("invalid device response: {0}")]
    InvalidDeviceResponse(String),

    /// Malformed argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid private key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid mnemonic or derivation path
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),
}

impl SdkError {
    /// Collapse node-side failures into [`SdkError::NetworkUnavailable`]
    pub(crate) fn into_network(self) -> Self {
        match self {
            SdkError::Rpc { message, .. } => SdkError::NetworkUnavailable(message),
            SdkError::UnknownRpcError { method } => {
                SdkError::NetworkUnavailable(format!("{} returned no result", method))
            }
            SdkError::Serialization(msg) => SdkError::NetworkUnavailable(msg),
            other => other,
        }
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<idena_crypto::CryptoError> for SdkError {
    fn from(e: idena_crypto::CryptoError) -> Self {
        use idena_crypto::CryptoError;
        match e {
            CryptoError::InvalidPrivateKey => SdkError::InvalidPrivateKey(e.to_string()),
            CryptoError::InvalidMnemonic(_) | CryptoError::Derivation(_) => {
                SdkError::InvalidMnemonic(e.to_string())
            }
            other => SdkError::SigningFailed(other.to_string()),
        }
    }
}

impl From<idena_primitives::PrimitiveError> for SdkError {
    fn from(e: idena_primitives::PrimitiveError) -> Self {
        SdkError::InvalidArgument(e.to_string())
    }
}

impl From<idena_primitives::AddressError> for SdkError {
    fn from(e: idena_primitives::AddressError) -> Self {
        SdkError::InvalidArgument(e.to_string())
    }
}

impl From<idena_primitives::HashError> for SdkError {
    fn from(e: idena_primitives::HashError) -> Self {
        SdkError::InvalidArgument(e.to_string())
    }
}

impl From<idena_primitives::AmountError> for SdkError {
    fn from(e: idena_primitives::AmountError) -> Self {
        SdkError::InvalidArgument(e.to_string())
    }
}

impl From<idena_rlp::RlpError> for SdkError {
    fn from(e: idena_rlp::RlpError) -> Self {
        SdkError::InvalidArgument(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_rejected_keeps_message() {
        let err = SdkError::SubmissionRejected("insufficient funds".to_string());
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn test_into_network() {
        let err = SdkError::Rpc { code: -32000, message: "boom".to_string() }.into_network();
        assert!(matches!(err, SdkError::NetworkUnavailable(ref m) if m == "boom"));

        let err = SdkError::ApplicationNotOpen.into_network();
        assert!(matches!(err, SdkError::ApplicationNotOpen));
    }
}
