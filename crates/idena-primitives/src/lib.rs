//! # idena-primitives
//!
//! Primitive types for the Idena transaction SDK.
//!
//! - [`Address`]: 20-byte account identifier
//! - [`H256`]: 32-byte transaction hash
//! - [`Dna`]: decimal DNA amount held as 10^18-scaled base units

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod amount;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use amount::{AmountError, Dna, DNA_DECIMALS};
pub use error::PrimitiveError;
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Per-address transaction sequence number
pub type Nonce = u32;

/// Network validation period counter
pub type Epoch = u16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_basic() {
        let a = U256::from(100u64);
        let b = U256::from(200u64);
        assert_eq!(a + b, U256::from(300u64));
    }
}
