//! URL-safe share tokens for calendar snapshots.
//!
//! A token is the snapshot's JSON text, base64-encoded with the URL-safe
//! alphabet substitutions (`+` → `-`, `/` → `_`) and without `=` padding, so
//! it can sit in a query string untouched. Nothing is signed or encrypted.

use base64::{engine::general_purpose, Engine};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why a share token could not be turned back into JSON.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid Base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode any JSON value into a share token.
///
/// Object keys come out sorted, so equal values produce equal tokens.
pub fn encode(value: &Value) -> String {
    let json = value.to_string();
    let base64 = general_purpose::STANDARD.encode(json.as_bytes());
    base64
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

/// Decode a share token back into the JSON value it carries.
pub fn decode(token: &str) -> Result<Value, DecodeError> {
    let json = decode_text(token)?;
    Ok(serde_json::from_str(&json)?)
}

/// Decode a share token straight into a typed payload.
pub fn decode_as<T: DeserializeOwned>(token: &str) -> Result<T, DecodeError> {
    let json = decode_text(token)?;
    Ok(serde_json::from_str(&json)?)
}

fn decode_text(token: &str) -> Result<String, DecodeError> {
    let mut base64: String = token
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = base64.len() % 4;
    if padding != 0 {
        base64.push_str(&"=".repeat(4 - padding));
    }

    let bytes = general_purpose::STANDARD.decode(base64)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_with_emoji() {
        let value = json!({
            "dateCells": {"2025-0-15": {"color": "red", "customText": "Hi 🎉"}},
            "selectedView": "Linear"
        });
        let token = encode(&value);
        assert_eq!(decode(&token).unwrap(), value);
    }

    #[test]
    fn test_token_is_url_safe() {
        // bytes chosen so that standard base64 would emit '+' and '/'
        let value = json!({"text": "~~~???>>>", "n": [1.5, -2, null, true]});
        let token = encode(&value);
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode(&token).unwrap(), value);
    }

    #[test]
    fn test_scalars_round_trip() {
        for value in [json!(null), json!(false), json!(0), json!("ü"), json!([])] {
            assert_eq!(decode(&encode(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(encode(&a), encode(&b));
    }

    #[test]
    fn test_truncated_token_fails() {
        let token = encode(&json!({"selectedView": "Classic"}));
        let truncated = &token[..token.len() - 3];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_garbage_token_fails() {
        assert!(matches!(decode("!!!"), Err(DecodeError::Base64(_))));
        // valid base64 of invalid UTF-8
        assert!(matches!(decode("_w"), Err(DecodeError::Utf8(_))));
        // valid base64 of "not json"
        let not_json = general_purpose::STANDARD.encode("not json");
        assert!(matches!(decode(&not_json), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_as_typed() {
        let token = encode(&json!({"a": [1, 2, 3]}));
        let parsed: std::collections::BTreeMap<String, Vec<u8>> = decode_as(&token).unwrap();
        assert_eq!(parsed["a"], vec![1, 2, 3]);
    }
}
