// cartsync/src/catalog/decode.rs

//! Lenient field decoders for API payloads.
//!
//! The storefront API serializes decimals as either JSON numbers or numeric
//! strings ("19.90"), and booleans as either `true`/`false` or `1`/`0`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Number or numeric string. Anything else, including `null`, is `None`.
pub fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
  .filter(|p| p.is_finite()))
}

pub fn lenient_opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Bool(b)) => Some(b),
    Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
    Some(Value::String(s)) => match s.trim() {
      "1" | "true" => Some(true),
      "0" | "false" => Some(false),
      _ => None,
    },
    _ => None,
  })
}

pub fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(lenient_opt_flag(deserializer)?.unwrap_or(false))
}

/// `null` reads as an empty list.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Deserialize)]
  struct Sample {
    #[serde(default, deserialize_with = "lenient_price")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_flag")]
    active: Option<bool>,
  }

  fn sample(raw: &str) -> Sample {
    serde_json::from_str(raw).unwrap()
  }

  #[test]
  fn prices_accept_numbers_and_numeric_strings() {
    assert_eq!(sample(r#"{"price": 12.5}"#).price, Some(12.5));
    assert_eq!(sample(r#"{"price": "19.90"}"#).price, Some(19.9));
    assert_eq!(sample(r#"{"price": 7}"#).price, Some(7.0));
  }

  #[test]
  fn unusable_prices_are_missing() {
    assert_eq!(sample(r#"{"price": null}"#).price, None);
    assert_eq!(sample(r#"{"price": "free"}"#).price, None);
    assert_eq!(sample(r#"{"price": "NaN"}"#).price, None);
    assert_eq!(sample(r#"{}"#).price, None);
  }

  #[test]
  fn flags_accept_integers() {
    assert_eq!(sample(r#"{"active": 1}"#).active, Some(true));
    assert_eq!(sample(r#"{"active": 0}"#).active, Some(false));
    assert_eq!(sample(r#"{"active": true}"#).active, Some(true));
    assert_eq!(sample(r#"{"active": "maybe"}"#).active, None);
  }
}
