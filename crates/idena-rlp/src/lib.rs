//! # idena-rlp
//!
//! Canonical RLP (Recursive Length Prefix) encoding for Idena transactions,
//! built on the `rlp` crate.
//!
//! A forged transaction is a flat list of [`RlpItem`]s. Every item is one of:
//!
//! - an unsigned integer, written as its minimal big-endian bytes (zero is the
//!   empty string `0x80`);
//! - a byte string (`0x`-prefixed hex text is decoded to bytes, any other
//!   text is taken as UTF-8);
//! - a nested list.
//!
//! ## RLP Encoding Rules
//!
//! - Single byte `[0x00, 0x7f]`: itself
//! - Short string (0-55 bytes): `0x80 + len` + data
//! - Long string (>55 bytes): `0xb7 + len_of_len` + len + data
//! - Short list (0-55 bytes payload): `0xc0 + len` + items
//! - Long list (>55 bytes payload): `0xf7 + len_of_len` + len + items

#![warn(missing_docs)]
#![warn(clippy::all)]

use primitive_types::U256;
use thiserror::Error;

// Re-export rlp crate for direct use
pub use rlp::{DecoderError, Encodable, Rlp, RlpStream};

/// RLP item error
#[derive(Debug, Error)]
pub enum RlpError {
    /// `0x`-prefixed text that is not valid hex
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Malformed RLP input
    #[error("rlp decode error: {0}")]
    Decode(#[from] DecoderError),

    /// Bytes left over after the top-level item
    #[error("{0} trailing bytes after rlp item")]
    TrailingBytes(usize),

    /// Integer wider than 256 bits
    #[error("integer wider than 32 bytes")]
    IntegerOverflow,
}

/// One field of a canonical encoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    /// Unsigned integer, minimal big-endian
    Uint(U256),
    /// Raw byte string
    Bytes(Vec<u8>),
    /// Nested list
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Unsigned integer item
    pub fn uint(value: impl Into<U256>) -> Self {
        RlpItem::Uint(value.into())
    }

    /// Byte string item
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(data.into())
    }

    /// Text item: `0x`-prefixed hex becomes its bytes, anything else its UTF-8 bytes
    ///
    /// Odd-length hex is left-padded with a zero nibble.
    pub fn text(s: &str) -> Result<Self, RlpError> {
        match s.strip_prefix("0x") {
            Some(digits) => {
                let bytes = if digits.len() % 2 == 1 {
                    hex::decode(format!("0{}", digits))
                } else {
                    hex::decode(digits)
                }
                .map_err(|e| RlpError::InvalidHex(format!("{}: {}", s, e)))?;
                Ok(RlpItem::Bytes(bytes))
            }
            None => Ok(RlpItem::Bytes(s.as_bytes().to_vec())),
        }
    }

    /// Decode a single top-level item
    ///
    /// Integers and byte strings share one wire form, so scalars always come
    /// back as [`RlpItem::Bytes`]; use [`RlpItem::to_uint`] to read them as numbers.
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        let rlp = Rlp::new(data);
        let info = rlp.payload_info()?;
        let total = info.header_len + info.value_len;
        if total != data.len() {
            return Err(RlpError::TrailingBytes(data.len().saturating_sub(total)));
        }
        decode_item(&rlp)
    }

    /// Borrow the byte string, if this is one
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the list items, if this is a list
    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items),
            _ => None,
        }
    }

    /// Read a scalar as an unsigned big-endian integer
    pub fn to_uint(&self) -> Result<U256, RlpError> {
        match self {
            RlpItem::Uint(v) => Ok(*v),
            RlpItem::Bytes(b) if b.len() <= 32 => Ok(U256::from_big_endian(b)),
            RlpItem::Bytes(_) => Err(RlpError::IntegerOverflow),
            RlpItem::List(_) => Err(RlpError::Decode(DecoderError::RlpExpectedToBeData)),
        }
    }
}

fn decode_item(rlp: &Rlp) -> Result<RlpItem, RlpError> {
    if rlp.is_list() {
        let items = rlp
            .iter()
            .map(|child| decode_item(&child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RlpItem::List(items))
    } else {
        Ok(RlpItem::Bytes(rlp.data()?.to_vec()))
    }
}

impl Encodable for RlpItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            RlpItem::Uint(value) => {
                s.append(value);
            }
            RlpItem::Bytes(bytes) => {
                s.encoder().encode_value(bytes);
            }
            RlpItem::List(items) => {
                s.begin_list(items.len());
                for item in items {
                    s.append(item);
                }
            }
        }
    }
}

impl From<u64> for RlpItem {
    fn from(value: u64) -> Self {
        RlpItem::uint(value)
    }
}

impl From<U256> for RlpItem {
    fn from(value: U256) -> Self {
        RlpItem::Uint(value)
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(value: Vec<u8>) -> Self {
        RlpItem::Bytes(value)
    }
}

/// Encode a single item
pub fn encode(item: &RlpItem) -> Vec<u8> {
    rlp::encode(item).to_vec()
}

/// Encode an ordered field list as one RLP list
pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(items.len());
    for item in items {
        stream.append(item);
    }
    stream.out().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_uint_minimal_encoding() {
        assert_eq!(encode(&RlpItem::uint(0u64)), vec![0x80]);
        assert_eq!(encode(&RlpItem::uint(1u64)), vec![0x01]);
        assert_eq!(encode(&RlpItem::uint(0x7fu64)), vec![0x7f]);
        assert_eq!(encode(&RlpItem::uint(0x80u64)), vec![0x81, 0x80]);
        assert_eq!(encode(&RlpItem::uint(0x0400u64)), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_large_uint() {
        // 0.001 DNA in base units
        let item = RlpItem::uint(1_000_000_000_000_000u64);
        assert_eq!(
            encode(&item),
            vec![0x87, 0x03, 0x8d, 0x7e, 0xa4, 0xc6, 0x80, 0x00]
        );
    }

    #[test]
    fn test_text_hex_and_utf8() {
        assert_eq!(RlpItem::text("0x").unwrap(), RlpItem::Bytes(vec![]));
        assert_eq!(RlpItem::text("0xabcd").unwrap(), RlpItem::Bytes(vec![0xab, 0xcd]));
        assert_eq!(RlpItem::text("0xabc").unwrap(), RlpItem::Bytes(vec![0x0a, 0xbc]));
        assert_eq!(RlpItem::text("dog").unwrap(), RlpItem::Bytes(b"dog".to_vec()));
        assert!(matches!(RlpItem::text("0xzz"), Err(RlpError::InvalidHex(_))));
    }

    #[test]
    fn test_empty_bytes() {
        assert_eq!(encode(&RlpItem::bytes(vec![])), vec![0x80]);
    }

    #[test]
    fn test_short_and_long_strings() {
        let short = encode(&RlpItem::bytes(vec![0x42; 55]));
        assert_eq!(short[0], 0xb7);
        assert_eq!(short.len(), 56);

        let long = encode(&RlpItem::bytes(vec![0x42; 56]));
        assert_eq!(&long[..2], &[0xb8, 56]);
        assert_eq!(long.len(), 58);
    }

    #[test]
    fn test_encode_list_known_vector() {
        // ["cat", "dog"]
        let items = [RlpItem::text("cat").unwrap(), RlpItem::text("dog").unwrap()];
        assert_eq!(
            encode_list(&items),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn test_nested_list() {
        // [ [], [[]], [ [], [[]] ] ]
        let empty = RlpItem::List(vec![]);
        let one = RlpItem::List(vec![empty.clone()]);
        let item = RlpItem::List(vec![
            empty.clone(),
            one.clone(),
            RlpItem::List(vec![empty, one]),
        ]);
        assert_eq!(
            encode(&item),
            vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
        );
    }

    #[test]
    fn test_long_list_header() {
        let items: Vec<RlpItem> = (0..60).map(|_| RlpItem::uint(1u64)).collect();
        let encoded = encode_list(&items);
        assert_eq!(&encoded[..2], &[0xf8, 60]);
    }

    #[test]
    fn test_decode_list_and_read_uints() {
        let items = [
            RlpItem::uint(5u64),
            RlpItem::uint(0u64),
            RlpItem::bytes(vec![0xaa; 20]),
        ];
        let decoded = RlpItem::decode(&encode_list(&items)).unwrap();
        let list = decoded.as_list().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].to_uint().unwrap(), U256::from(5u64));
        assert_eq!(list[1].to_uint().unwrap(), U256::zero());
        assert_eq!(list[2].as_bytes().unwrap(), &[0xaa; 20]);
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut encoded = encode_list(&[RlpItem::uint(1u64)]);
        encoded.push(0x00);
        assert!(matches!(RlpItem::decode(&encoded), Err(RlpError::TrailingBytes(1))));
    }

    proptest! {
        #[test]
        fn prop_encoding_is_deterministic(
            nums in proptest::collection::vec(any::<u64>(), 0..10),
            blob in proptest::collection::vec(any::<u8>(), 0..100),
        ) {
            let mut items: Vec<RlpItem> = nums.into_iter().map(RlpItem::from).collect();
            items.push(RlpItem::bytes(blob));
            prop_assert_eq!(encode_list(&items), encode_list(&items.clone()));
        }
    }
}
