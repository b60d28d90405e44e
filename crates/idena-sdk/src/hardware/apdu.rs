//! APDU command encoding and response decoding for the Idena device app

use idena_crypto::Signature;
use idena_primitives::Address;

use crate::SdkError;

/// Instruction class
pub const CLA: u8 = 0xe0;
/// Get-address instruction
pub const INS_GET_ADDRESS: u8 = 0x02;
/// Sign instruction
pub const INS_SIGN: u8 = 0x04;
/// Length of the trailing status word
pub const STATUS_WORD_LEN: usize = 2;
/// Status word of a successful exchange
pub const SW_OK: [u8; 2] = [0x90, 0x00];

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Encode a BIP32 path such as `44'/515'/0'/0/0`
///
/// Each component becomes a 4-byte big-endian integer; hardened components
/// (suffixed `'`) have the top bit set. An optional leading `m` is skipped.
pub fn encode_bip32_path(path: &str) -> Result<Vec<u8>, SdkError> {
    let path = path.trim();
    let path = path
        .strip_prefix("m/")
        .or_else(|| path.strip_prefix('m'))
        .unwrap_or(path);
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let mut encoded = Vec::with_capacity(4 * path.split('/').count());
    for component in path.split('/') {
        let invalid = || SdkError::InvalidArgument(format!("invalid path component '{}'", component));
        let (digits, hardened) = match component.strip_suffix('\'') {
            Some(digits) => (digits, true),
            None => (component, false),
        };
        let value: u32 = digits.parse().map_err(|_| invalid())?;
        if value >= HARDENED_OFFSET {
            return Err(invalid());
        }
        let value = if hardened { value + HARDENED_OFFSET } else { value };
        encoded.extend_from_slice(&value.to_be_bytes());
    }
    Ok(encoded)
}

/// Render an encoded BIP32 path back to text
pub fn decode_bip32_path(encoded: &[u8]) -> Result<String, SdkError> {
    if encoded.len() % 4 != 0 {
        return Err(SdkError::InvalidArgument(format!(
            "encoded path length {} is not a multiple of 4",
            encoded.len()
        )));
    }
    let components: Vec<String> = encoded
        .chunks_exact(4)
        .map(|chunk| {
            let value = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            if value >= HARDENED_OFFSET {
                format!("{}'", value - HARDENED_OFFSET)
            } else {
                value.to_string()
            }
        })
        .collect();
    Ok(components.join("/"))
}

fn build_command(ins: u8, p1: u8, path: &str, data: &[u8]) -> Result<Vec<u8>, SdkError> {
    let encoded_path = encode_bip32_path(path)?;
    let body_len = encoded_path.len() + 1 + data.len();
    let length = u8::try_from(body_len).map_err(|_| {
        SdkError::InvalidArgument(format!("APDU body of {} bytes exceeds 255", body_len))
    })?;
    let count = (encoded_path.len() / 4) as u8;

    let mut command = Vec::with_capacity(6 + body_len);
    command.extend_from_slice(&[CLA, ins, p1, 0x00, length, count]);
    command.extend_from_slice(&encoded_path);
    command.extend_from_slice(data);
    Ok(command)
}

/// `e0 02 01 00 | len | count | path`
pub fn build_get_address_command(path: &str) -> Result<Vec<u8>, SdkError> {
    build_command(INS_GET_ADDRESS, 0x01, path, &[])
}

/// `e0 04 00 00 | len | count | path | message`
pub fn build_sign_command(path: &str, message: &[u8]) -> Result<Vec<u8>, SdkError> {
    build_command(INS_SIGN, 0x00, path, message)
}

/// Drop the trailing status word; shorter responses yield an empty payload
pub fn strip_status_word(response: &[u8]) -> &[u8] {
    &response[..response.len().saturating_sub(STATUS_WORD_LEN)]
}

/// Parse `n | pubkey(n) | m | address(m)` into an address
pub fn decode_address_response(payload: &[u8]) -> Result<Address, SdkError> {
    let pubkey_len = *payload.first().ok_or(SdkError::ApplicationNotOpen)? as usize;
    let offset = 1 + pubkey_len;
    let address_len = *payload.get(offset).ok_or_else(|| {
        SdkError::InvalidDeviceResponse(format!("address response truncated at {}", offset))
    })? as usize;
    let raw = payload
        .get(offset + 1..offset + 1 + address_len)
        .ok_or_else(|| SdkError::InvalidDeviceResponse("address bytes truncated".to_string()))?;
    let text = std::str::from_utf8(raw)
        .map_err(|e| SdkError::InvalidDeviceResponse(e.to_string()))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    Address::from_hex(&format!("0x{}", digits))
        .map_err(|e| SdkError::InvalidDeviceResponse(e.to_string()))
}

/// Parse a 65-byte `r || s || v` signature
pub fn decode_signature_response(payload: &[u8]) -> Result<Signature, SdkError> {
    if payload.is_empty() {
        return Err(SdkError::ApplicationNotOpen);
    }
    Signature::from_slice(payload).map_err(|e| SdkError::InvalidDeviceResponse(e.to_string()))
}
