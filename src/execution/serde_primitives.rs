use std::str::FromStr;

use num_bigint::BigUint;
use serde::{self, Deserialize, Deserializer, Serializer};

/// Amounts arrive either as decimal strings (any size) or as plain JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum BigUintRepr {
    Text(String),
    Number(u64),
}

fn deserialize_biguint<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    match BigUintRepr::deserialize(deserializer)? {
        BigUintRepr::Text(s) => BigUint::from_str(s.trim()).map_err(serde::de::Error::custom),
        BigUintRepr::Number(n) => Ok(BigUint::from(n)),
    }
}

pub mod biguint_string {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_biguint(deserializer)
    }
}

/// Receipt status as the `0 | 1` integer reported by nodes.
pub mod status_bit {
    use super::*;

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!("invalid receipt status {other}"))),
        }
    }
}
