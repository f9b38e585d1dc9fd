use {
    crate::num::{big_int_to_u256, u256_to_big_int},
    num::BigRational,
    primitive_types::U256,
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    std::str::FromStr,
    thiserror::Error,
};

/// A validated coin denomination: lowercase alphanumeric (plus `/` for IBC
/// style paths), at least three characters, starting with a letter.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Denom(String);

impl Denom {
    pub fn new(denom: impl Into<String>) -> Result<Self, CoinError> {
        let denom = denom.into();
        let valid = denom.len() >= 3
            && denom.chars().next().is_some_and(|c| c.is_ascii_lowercase())
            && denom
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '/');
        if !valid {
            return Err(CoinError::InvalidDenom(denom));
        }
        Ok(Self(denom))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Denom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Denom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FromStr for Denom {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// An amount of a single denomination. Amounts are non-negative by
/// construction; arithmetic across denominations is an error.
#[derive(Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: Denom,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: Denom, amount: impl Into<U256>) -> Self {
        Self {
            denom,
            amount: amount.into(),
        }
    }

    pub fn zero(denom: Denom) -> Self {
        Self::new(denom, U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn same_denom(&self, other: &Self) -> Result<(), CoinError> {
        if self.denom != other.denom {
            return Err(CoinError::DenomMismatch {
                left: self.denom.clone(),
                right: other.denom.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, CoinError> {
        self.same_denom(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(CoinError::Overflow)?;
        Ok(Self::new(self.denom.clone(), amount))
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, CoinError> {
        self.same_denom(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(CoinError::Overflow)?;
        Ok(Self::new(self.denom.clone(), amount))
    }

    /// Compares amounts; refuses to order coins of different denominations.
    pub fn cmp_amount(&self, other: &Self) -> Result<std::cmp::Ordering, CoinError> {
        self.same_denom(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Multiplies the amount by an exact fraction, rounding down.
    pub fn mul_floor(&self, fraction: &BigRational) -> Self {
        let scaled = BigRational::from_integer(u256_to_big_int(&self.amount)) * fraction;
        let amount = big_int_to_u256(&scaled.floor().to_integer())
            // The fractions used on coins are in [0, 1], so flooring can
            // never grow the amount past its original width.
            .unwrap_or(self.amount);
        Self::new(self.denom.clone(), amount)
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl std::fmt::Debug for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl FromStr for Coin {
    type Err = CoinError;

    /// Parses the normalized `<amount><denom>` form, e.g. `1000uatom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, denom) = s.split_at(split);
        if digits.is_empty() {
            return Err(CoinError::InvalidCoin(s.to_owned()));
        }
        let amount =
            U256::from_dec_str(digits).map_err(|_| CoinError::InvalidCoin(s.to_owned()))?;
        Ok(Self::new(Denom::new(denom)?, amount))
    }
}

impl Serialize for Coin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Coin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoinError {
    #[error("invalid denomination {0:?}")]
    InvalidDenom(String),
    #[error("invalid coin {0:?}, expected the form \"1000uatom\"")]
    InvalidCoin(String),
    #[error("denomination mismatch: {left} vs {right}")]
    DenomMismatch { left: Denom, right: Denom },
    #[error("coin amount overflow")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use {super::*, num::BigInt};

    fn uatom(amount: u64) -> Coin {
        Coin::new(Denom::new("uatom").unwrap(), amount)
    }

    #[test]
    fn parses_normalized_form() {
        assert_eq!("1000uatom".parse::<Coin>().unwrap(), uatom(1000));
        assert_eq!("0uatom".parse::<Coin>().unwrap(), uatom(0));
        assert!("uatom".parse::<Coin>().is_err());
        assert!("1000".parse::<Coin>().is_err());
        assert!("1000UATOM".parse::<Coin>().is_err());
    }

    #[test]
    fn denom_validation() {
        assert!(Denom::new("uatom").is_ok());
        assert!(Denom::new("ibc/27394").is_ok());
        assert!(Denom::new("ab").is_err());
        assert!(Denom::new("1atom").is_err());
    }

    #[test]
    fn arithmetic_requires_matching_denoms() {
        let stake = Coin::new(Denom::new("stake").unwrap(), 1u64);
        assert!(matches!(
            uatom(1).checked_add(&stake),
            Err(CoinError::DenomMismatch { .. })
        ));
        assert_eq!(uatom(3).checked_sub(&uatom(1)).unwrap(), uatom(2));
        assert!(uatom(1).checked_sub(&uatom(2)).is_err());
    }

    #[test]
    fn mul_floor_rounds_down() {
        let quarter = BigRational::new(BigInt::from(1), BigInt::from(4));
        assert_eq!(uatom(1001).mul_floor(&quarter), uatom(250));
        assert_eq!(uatom(0).mul_floor(&quarter), uatom(0));
    }
}
