//! SCALE value to JSON conversion and account decoding.

use subxt::ext::scale_value::{Composite, Primitive, Value, ValueDef};

use courier_core::error::{ChainError, ChainResult};
use courier_core::models::AccountBalance;

// =============================================================================
// SCALE Value to JSON conversion
// =============================================================================

/// Convert a Composite to a JSON value.
pub(crate) fn composite_to_json<T>(composite: &Composite<T>) -> serde_json::Value {
    match composite {
        Composite::Unnamed(values) => {
            // AccountId, Hash, memo: render byte arrays as hex
            if let Some(hex_str) = try_as_byte_array(values) {
                return serde_json::Value::String(hex_str);
            }
            // Newtype wrappers
            if values.len() == 1 {
                return value_to_json(&values[0]);
            }
            serde_json::Value::Array(values.iter().map(value_to_json).collect())
        }
        Composite::Named(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Interpret an unnamed composite of bytes as hex.
///
/// Only 20, 32 and 64 byte arrays qualify so short tuples of small
/// integers stay as arrays.
fn try_as_byte_array<T>(values: &[Value<T>]) -> Option<String> {
    if !matches!(values.len(), 20 | 32 | 64) {
        return None;
    }

    let bytes = values
        .iter()
        .map(|value| match &value.value {
            ValueDef::Primitive(Primitive::U128(n)) => u8::try_from(*n).ok(),
            _ => None,
        })
        .collect::<Option<Vec<u8>>>()?;

    Some(format!("0x{}", hex::encode(bytes)))
}

/// Convert a Value to a JSON value.
pub(crate) fn value_to_json<T>(value: &Value<T>) -> serde_json::Value {
    match &value.value {
        ValueDef::Composite(composite) => composite_to_json(composite),
        ValueDef::Variant(variant) => {
            let inner = composite_to_json(&variant.values);
            match variant.name.as_str() {
                "None" => serde_json::Value::Null,
                // Option and MultiAddress wrappers
                "Some" | "Id" => inner,
                name => {
                    let mut map = serde_json::Map::new();
                    map.insert(name.to_string(), inner);
                    serde_json::Value::Object(map)
                }
            }
        }
        ValueDef::Primitive(primitive) => primitive_to_json(primitive),
        ValueDef::BitSequence(bits) => serde_json::Value::String(format!("{:?}", bits)),
    }
}

/// Convert a Primitive to a JSON value.
///
/// Integers become strings: balances are u128 and do not fit JSON numbers.
fn primitive_to_json(primitive: &Primitive) -> serde_json::Value {
    match primitive {
        Primitive::Bool(b) => serde_json::Value::Bool(*b),
        Primitive::Char(c) => serde_json::Value::String(c.to_string()),
        Primitive::String(s) => serde_json::Value::String(s.clone()),
        Primitive::U128(n) => serde_json::Value::String(n.to_string()),
        Primitive::I128(n) => serde_json::Value::String(n.to_string()),
        Primitive::U256(n) => serde_json::Value::String(format!("{:?}", n)),
        Primitive::I256(n) => serde_json::Value::String(format!("{:?}", n)),
    }
}

// =============================================================================
// Account decoding
// =============================================================================

/// Parse an amount (u128) from JSON.
fn parse_amount(value: &serde_json::Value) -> Option<u128> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(u128::from),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// First of `keys` present in `data`, parsed as an amount.
fn amount_field(data: &serde_json::Value, keys: &[&str]) -> Option<u128> {
    keys.iter().find_map(|key| data.get(*key)).and_then(parse_amount)
}

/// Extract balances from a decoded `System.Account` value.
///
/// Handles both the current `frozen` layout and the older
/// `misc_frozen` / `fee_frozen` split (the larger of the two is frozen).
pub(crate) fn balance_from_account_info(info: &serde_json::Value) -> ChainResult<AccountBalance> {
    let data = info
        .get("data")
        .ok_or_else(|| ChainError::DecodingError("AccountInfo has no 'data' field".into()))?;

    let free = amount_field(data, &["free"])
        .ok_or_else(|| ChainError::DecodingError(format!("No 'free' balance in {}", data)))?;
    let reserved = amount_field(data, &["reserved"]).unwrap_or_default();
    let frozen = amount_field(data, &["frozen"]).unwrap_or_else(|| {
        let misc = amount_field(data, &["misc_frozen"]).unwrap_or_default();
        let fee = amount_field(data, &["fee_frozen"]).unwrap_or_default();
        misc.max(fee)
    });

    Ok(AccountBalance {
        free,
        reserved,
        frozen,
    })
}
