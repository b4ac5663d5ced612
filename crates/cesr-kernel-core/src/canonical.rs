//! Canonical serialization of field maps.
//!
//! Both kinds are deterministic and preserve field insertion order, which is
//! what makes the version marker and the digest field land at fixed byte
//! positions:
//! - JSON: compact separators, no whitespace
//! - CBOR: definite lengths only, smallest integer encodings, no floats
//!
//! CBOR maps are NOT sorted; field order is meaningful here (the version
//! field must come first) and the digest procedure depends on byte-stable
//! re-serialization of the same map.

use serde_json::{Map, Value};
use std::io::Cursor;

use crate::error::{CoreError, Result};
use crate::version::SerialKind;

/// Serialize a field map with the given kind.
pub fn serialize_map(fields: &Map<String, Value>, kind: SerialKind) -> Result<Vec<u8>> {
    match kind {
        SerialKind::Json => Ok(serde_json::to_vec(fields)?),
        SerialKind::Cbor => {
            let mut buf = Vec::new();
            encode_map(&mut buf, fields)?;
            Ok(buf)
        }
    }
}

/// Deserialize a field map, requiring the whole input to be consumed.
pub fn deserialize_map(raw: &[u8], kind: SerialKind) -> Result<Map<String, Value>> {
    match kind {
        SerialKind::Json => {
            let value: Value = serde_json::from_slice(raw)?;
            match value {
                Value::Object(map) => Ok(map),
                _ => Err(CoreError::Cbor("top-level value is not a map".into())),
            }
        }
        SerialKind::Cbor => {
            let mut cursor = Cursor::new(raw);
            let value: ciborium::Value = ciborium::from_reader(&mut cursor)
                .map_err(|e| CoreError::Cbor(e.to_string()))?;
            if cursor.position() as usize != raw.len() {
                return Err(CoreError::SizeMismatch {
                    declared: raw.len(),
                    actual: cursor.position() as usize,
                });
            }
            match cbor_to_json(value)? {
                Value::Object(map) => Ok(map),
                _ => Err(CoreError::Cbor("top-level value is not a map".into())),
            }
        }
    }
}

fn encode_map(buf: &mut Vec<u8>, fields: &Map<String, Value>) -> Result<()> {
    encode_uint(buf, 5, fields.len() as u64);
    for (key, value) in fields {
        encode_text(buf, key);
        encode_value(buf, value)?;
    }
    Ok(())
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                encode_uint(buf, 0, u);
            } else if let Some(i) = n.as_i64() {
                encode_uint(buf, 1, (-1 - i) as u64);
            } else {
                return Err(CoreError::Cbor("floats are not encodable".into()));
            }
        }
        Value::String(s) => encode_text(buf, s),
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value(buf, item)?;
            }
        }
        Value::Object(map) => encode_map(buf, map)?,
    }
    Ok(())
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an unsigned integer with the given major type, smallest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn cbor_to_json(value: ciborium::Value) -> Result<Value> {
    Ok(match value {
        ciborium::Value::Null => Value::Null,
        ciborium::Value::Bool(b) => Value::Bool(b),
        ciborium::Value::Integer(i) => {
            let n: i128 = i.into();
            if n >= 0 {
                Value::from(n as u64)
            } else {
                // CBOR negatives reach down to -2^64; only what a JSON
                // number can hold losslessly is accepted.
                let v = i64::try_from(n)
                    .map_err(|_| CoreError::Cbor(format!("integer {n} out of range")))?;
                Value::from(v)
            }
        }
        ciborium::Value::Text(s) => Value::String(s),
        ciborium::Value::Array(arr) => Value::Array(
            arr.into_iter().map(cbor_to_json).collect::<Result<Vec<_>>>()?,
        ),
        ciborium::Value::Map(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match k {
                    ciborium::Value::Text(s) => s,
                    other => {
                        return Err(CoreError::Cbor(format!("non-text map key: {other:?}")))
                    }
                };
                map.insert(key, cbor_to_json(v)?);
            }
            Value::Object(map)
        }
        other => return Err(CoreError::Cbor(format!("unsupported value: {other:?}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_json_is_compact() {
        let map = fields(json!({"v": "KERI10JSON000000_", "t": "icp", "s": "0"}));
        let raw = serialize_map(&map, SerialKind::Json).unwrap();
        assert_eq!(raw, br#"{"v":"KERI10JSON000000_","t":"icp","s":"0"}"#);
    }

    #[test]
    fn test_json_preserves_insertion_order() {
        let map = fields(json!({"z": 1, "a": 2, "m": 3}));
        let raw = serialize_map(&map, SerialKind::Json).unwrap();
        assert_eq!(raw, br#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_cbor_roundtrip() {
        let map = fields(json!({
            "v": "ACDC10CBOR000000_",
            "n": 42,
            "neg": -7,
            "big": 100000,
            "flag": true,
            "none": null,
            "list": ["a", "b"],
            "nested": {"x": 1},
        }));
        let raw = serialize_map(&map, SerialKind::Cbor).unwrap();
        let back = deserialize_map(&raw, SerialKind::Cbor).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_cbor_preserves_insertion_order() {
        let map = fields(json!({"z": "1", "a": "2"}));
        let raw = serialize_map(&map, SerialKind::Cbor).unwrap();
        // a2 (map-2), then "z" before "a" despite sort order.
        assert_eq!(raw[0], 0xa2);
        assert_eq!(&raw[1..3], &[0x61, b'z']);
    }

    #[test]
    fn test_cbor_smallest_integer_forms() {
        let map = fields(json!({"a": 10, "b": 200, "c": 70000}));
        let raw = serialize_map(&map, SerialKind::Cbor).unwrap();
        let expected: Vec<u8> = vec![
            0xa3, 0x61, b'a', 0x0a, 0x61, b'b', 0x18, 0xc8, 0x61, b'c', 0x1a, 0x00, 0x01, 0x11,
            0x70,
        ];
        assert_eq!(raw, expected);
    }

    #[test]
    fn test_cbor_rejects_floats() {
        let map = fields(json!({"x": 1.5}));
        assert!(matches!(
            serialize_map(&map, SerialKind::Cbor),
            Err(CoreError::Cbor(_))
        ));
    }

    #[test]
    fn test_cbor_rejects_trailing_bytes() {
        let map = fields(json!({"a": 1}));
        let mut raw = serialize_map(&map, SerialKind::Cbor).unwrap();
        raw.push(0x00);
        assert!(deserialize_map(&raw, SerialKind::Cbor).is_err());
    }

    #[test]
    fn test_cbor_negative_integer_bounds() {
        // {"a": i64::MIN} encodes as major-type-1 with value 2^63 - 1.
        let mut raw = vec![0xa1, 0x61, b'a', 0x3b];
        raw.extend_from_slice(&(i64::MAX as u64).to_be_bytes());
        let map = deserialize_map(&raw, SerialKind::Cbor).unwrap();
        assert_eq!(map.get("a").and_then(Value::as_i64), Some(i64::MIN));

        // {"a": -2^64} is valid CBOR but has no lossless JSON form.
        let mut raw = vec![0xa1, 0x61, b'a', 0x3b];
        raw.extend_from_slice(&u64::MAX.to_be_bytes());
        assert!(matches!(
            deserialize_map(&raw, SerialKind::Cbor),
            Err(CoreError::Cbor(_))
        ));
    }

    #[test]
    fn test_cbor_rejects_non_text_keys() {
        // {1: 2}
        let raw = [0xa1, 0x01, 0x02];
        assert!(matches!(
            deserialize_map(&raw, SerialKind::Cbor),
            Err(CoreError::Cbor(_))
        ));
    }
}
