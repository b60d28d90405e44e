//! DNA amounts
//!
//! Every amount-like value (transfer amount, max fee, tips, balances) is a
//! decimal number of DNA. On the wire it is an integer number of base units,
//! `round(dna * 10^18)`. [`Dna`] keeps the base-unit integer so that encoding
//! never goes through floating point unless the caller starts from an `f64`.

use std::fmt;
use std::str::FromStr;
use primitive_types::U256;
use thiserror::Error;

/// Number of decimal places between DNA and its base unit
pub const DNA_DECIMALS: usize = 18;

/// Amount parsing error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Not a plain non-negative decimal number
    #[error("invalid decimal amount: {0}")]
    InvalidDecimal(String),
    /// Negative, NaN or infinite float
    #[error("amount must be a finite non-negative number, got {0}")]
    NotFinite(String),
    /// Value does not fit in 256 bits of base units
    #[error("amount overflow: {0}")]
    Overflow(String),
}

/// A DNA amount stored as 10^18-scaled base units
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dna(U256);

fn scale() -> U256 {
    U256::exp10(DNA_DECIMALS)
}

impl Dna {
    /// Zero DNA
    pub const ZERO: Dna = Dna(U256([0; 4]));

    /// Wrap an integer number of base units
    pub fn from_base_units(units: impl Into<U256>) -> Self {
        Dna(units.into())
    }

    /// Integer number of base units (`dna * 10^18`)
    pub fn base_units(&self) -> U256 {
        self.0
    }

    /// Whole DNA, no fractional part
    pub fn from_whole(dna: u64) -> Self {
        Dna(U256::from(dna) * scale())
    }

    /// Scale a float by 10^18 and round to the nearest base unit
    pub fn from_f64(dna: f64) -> Result<Self, AmountError> {
        if !dna.is_finite() || dna < 0.0 {
            return Err(AmountError::NotFinite(dna.to_string()));
        }
        let units = (dna * 1e18).round();
        if units >= u128::MAX as f64 {
            return Err(AmountError::Overflow(dna.to_string()));
        }
        Ok(Dna(U256::from(units as u128)))
    }

    /// Parse a plain decimal string such as `"0.001"` or `"100000000"`
    ///
    /// Digits past the 18th decimal place are rounded half-up.
    pub fn from_dna_str(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        let invalid = || AmountError::InvalidDecimal(s.to_string());

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }

        let whole = if int_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(int_part).map_err(|_| AmountError::Overflow(s.to_string()))?
        };
        let mut units = whole
            .checked_mul(scale())
            .ok_or_else(|| AmountError::Overflow(s.to_string()))?;

        let kept = &frac_part[..frac_part.len().min(DNA_DECIMALS)];
        if !kept.is_empty() {
            let padded = format!("{:0<width$}", kept, width = DNA_DECIMALS);
            let frac = U256::from_dec_str(&padded).map_err(|_| invalid())?;
            units = units
                .checked_add(frac)
                .ok_or_else(|| AmountError::Overflow(s.to_string()))?;
        }
        if frac_part.len() > DNA_DECIMALS && frac_part.as_bytes()[DNA_DECIMALS] >= b'5' {
            units = units
                .checked_add(U256::one())
                .ok_or_else(|| AmountError::Overflow(s.to_string()))?;
        }
        Ok(Dna(units))
    }

    /// True when the amount is exactly zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition
    pub fn checked_add(self, other: Dna) -> Option<Dna> {
        self.0.checked_add(other.0).map(Dna)
    }

    /// Checked multiplication by an integer factor
    pub fn checked_mul(self, factor: u64) -> Option<Dna> {
        self.0.checked_mul(U256::from(factor)).map(Dna)
    }

    /// Checked integer division
    pub fn checked_div(self, divisor: u64) -> Option<Dna> {
        if divisor == 0 {
            return None;
        }
        Some(Dna(self.0 / U256::from(divisor)))
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, frac) = self.0.div_mod(scale());
        if frac.is_zero() {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = DNA_DECIMALS);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dna({})", self)
    }
}

impl FromStr for Dna {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dna_str(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Dna {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    struct DnaVisitor;

    impl<'de> de::Visitor<'de> for DnaVisitor {
        type Value = Dna;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal DNA amount as string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Dna, E> {
            Dna::from_dna_str(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Dna, E> {
            Ok(Dna::from_whole(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Dna, E> {
            u64::try_from(v)
                .map(Dna::from_whole)
                .map_err(|_| E::custom(AmountError::NotFinite(v.to_string())))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Dna, E> {
            Dna::from_f64(v).map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Dna {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(DnaVisitor)
        }
    }
}
