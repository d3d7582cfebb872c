// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One as _, ToPrimitive as _};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional bits in the fixed-point chain weight encoding.
pub const WEIGHT_FRACTIONAL_BITS: u32 = 32;

const FRACTION_MASK: u64 = (1 << WEIGHT_FRACTIONAL_BITS) - 1;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WeightError {
    #[error("chain weight cannot be negative: {0}")]
    Negative(BigRational),
    #[error("chain weight {0} does not fit the fixed-point encoding")]
    Overflow(BigRational),
}

/// Unsigned fixed-point chain weight, 32 integer bits and 32 fractional bits.
///
/// This is the encoding stored in the `weight` field of every block header, so
/// weights computed on different nodes compare bit for bit. Converting to a
/// [`BigRational`] is exact; converting back truncates toward zero.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainWeight(u64);

impl ChainWeight {
    pub const ZERO: ChainWeight = ChainWeight(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Weight with no fractional part.
    pub fn from_integer(value: u32) -> Self {
        Self(u64::from(value) << WEIGHT_FRACTIONAL_BITS)
    }

    pub fn to_ratio(self) -> BigRational {
        BigRational::new(
            BigInt::from(self.0),
            BigInt::one() << WEIGHT_FRACTIONAL_BITS,
        )
    }

    pub fn try_from_ratio(ratio: &BigRational) -> Result<Self, WeightError> {
        if ratio.numer().sign() == Sign::Minus {
            return Err(WeightError::Negative(ratio.clone()));
        }
        // BigInt division truncates toward zero
        let scaled = (ratio.numer() << WEIGHT_FRACTIONAL_BITS) / ratio.denom();
        scaled
            .to_u64()
            .map(Self)
            .ok_or_else(|| WeightError::Overflow(ratio.clone()))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<&BigRational> for ChainWeight {
    type Error = WeightError;

    fn try_from(value: &BigRational) -> Result<Self, Self::Error> {
        Self::try_from_ratio(value)
    }
}

impl From<ChainWeight> for BigRational {
    fn from(value: ChainWeight) -> Self {
        value.to_ratio()
    }
}

impl fmt::Display for ChainWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 >> WEIGHT_FRACTIONAL_BITS;
        let fraction =
            (u128::from(self.0 & FRACTION_MASK) * 10_000_000_000) >> WEIGHT_FRACTIONAL_BITS;
        write!(f, "{integer}.{fraction:010}")
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for ChainWeight {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(u64::arbitrary(g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[quickcheck]
    fn ratio_round_trip_is_exact(w: ChainWeight) {
        assert_eq!(ChainWeight::try_from_ratio(&w.to_ratio()), Ok(w));
    }

    #[quickcheck]
    fn ordering_matches_ratio_ordering(a: ChainWeight, b: ChainWeight) {
        assert_eq!(a.cmp(&b), a.to_ratio().cmp(&b.to_ratio()));
    }

    #[test]
    fn integers_encode_in_the_high_word() {
        assert_eq!(ChainWeight::from_integer(10).to_bits(), 10 << 32);
        assert_eq!(ChainWeight::from_integer(0), ChainWeight::ZERO);
        assert!(ChainWeight::ZERO.is_zero());
    }

    #[test]
    fn conversion_truncates_toward_zero() {
        // 1/3 = 0x5555_5555.55.. in the fractional word
        let w = ChainWeight::try_from_ratio(&ratio(1, 3)).unwrap();
        assert_eq!(w.to_bits(), 0x5555_5555);
        assert!(w.to_ratio() < ratio(1, 3));

        let w = ChainWeight::try_from_ratio(&ratio(2, 3)).unwrap();
        assert_eq!(w.to_bits(), 0xAAAA_AAAA);
    }

    #[test]
    fn negative_and_overflowing_values_are_rejected() {
        assert!(matches!(
            ChainWeight::try_from_ratio(&ratio(-1, 2)),
            Err(WeightError::Negative(_))
        ));
        let too_big = BigRational::from_integer(BigInt::one() << 32);
        assert!(matches!(
            ChainWeight::try_from_ratio(&too_big),
            Err(WeightError::Overflow(_))
        ));
        let max = BigRational::from_integer((BigInt::one() << 32) - 1);
        assert!(ChainWeight::try_from_ratio(&max).is_ok());
    }

    #[test]
    fn display_shows_decimal_fraction() {
        assert_eq!(ChainWeight::from_integer(3).to_string(), "3.0000000000");
        assert_eq!(
            ChainWeight::try_from_ratio(&ratio(1, 2)).unwrap().to_string(),
            "0.5000000000"
        );
    }

    #[test]
    fn cbor_encoding_is_a_plain_integer() {
        let w = ChainWeight::from_bits(42);
        assert_eq!(
            fvm_ipld_encoding::to_vec(&w).unwrap(),
            fvm_ipld_encoding::to_vec(&42_u64).unwrap()
        );
    }
}
