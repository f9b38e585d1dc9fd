//! Serde support for exact fractions written as decimal strings
//! (`"0.25"`), the form used in params files and query responses.

use {
    bigdecimal::BigDecimal,
    num::BigRational,
    serde::{de, Deserialize, Deserializer, Serializer},
    serde_with::{DeserializeAs, SerializeAs},
    std::{borrow::Cow, str::FromStr},
};

pub struct DecimalBigRational;

impl<'de> DeserializeAs<'de, BigRational> for DecimalBigRational {
    fn deserialize_as<D>(deserializer: D) -> Result<BigRational, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer)
    }
}

impl SerializeAs<BigRational> for DecimalBigRational {
    fn serialize_as<S>(source: &BigRational, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize(source, serializer)
    }
}

pub fn serialize<S>(value: &BigRational, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_decimal_string(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigRational, D::Error>
where
    D: Deserializer<'de>,
{
    parse_decimal(&Cow::<str>::deserialize(deserializer)?)
        .map_err(|err| de::Error::custom(format!("failed to decode decimal fraction: {err}")))
}

pub fn to_decimal_string(value: &BigRational) -> String {
    let decimal =
        BigDecimal::from(value.numer().clone()) / BigDecimal::from(value.denom().clone());
    decimal.normalized().to_string()
}

/// Parses `"0.25"` into the exact fraction `1/4`.
pub fn parse_decimal(input: &str) -> Result<BigRational, ParseDecimalError> {
    let decimal =
        BigDecimal::from_str(input).map_err(|_| ParseDecimalError(input.to_owned()))?;
    let (mantissa, exponent) = decimal.into_bigint_and_exponent();
    let numerator = BigRational::from_integer(mantissa);
    let ten = BigRational::from_integer(10.into());
    let exponent =
        i32::try_from(exponent).map_err(|_| ParseDecimalError(input.to_owned()))?;
    Ok(numerator / ten.pow(exponent))
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("not a decimal number: {0:?}")]
pub struct ParseDecimalError(pub String);
