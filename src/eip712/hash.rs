//! Typed-data encoding and hashing
//!
//! Implements `encodeType`, `hashStruct`, the domain separator and the final
//! signing digest `keccak256("\x19\x01" || domainSeparator || hashStruct(message))`.

use super::types::{
    base_type, is_dynamic_type, Eip712Domain, Eip712Error, TypedData, TypedDataField,
};
use crate::crypto::keccak256;
use std::collections::{BTreeSet, HashMap};

const TYPED_DATA_PREFIX: &[u8] = b"\x19\x01";

type Types = HashMap<String, Vec<TypedDataField>>;

/// Canonical type string: the primary type followed by every transitively
/// referenced struct type, sorted by name.
///
/// `Mail(Person from,Person to,string contents)Person(string name,address wallet)`
pub fn encode_type(name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(name)
        .ok_or_else(|| Eip712Error::UnknownType(name.to_string()))?;

    let mut out = format_type(name, fields);
    for dep in referenced_types(name, types) {
        if dep != name {
            // referenced_types only yields declared names
            if let Some(dep_fields) = types.get(&dep) {
                out.push_str(&format_type(&dep, dep_fields));
            }
        }
    }
    Ok(out)
}

fn format_type(name: &str, fields: &[TypedDataField]) -> String {
    let inner: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.kind, f.name))
        .collect();
    format!("{}({})", name, inner.join(","))
}

/// All struct types reachable from `name`, sorted. A BTreeSet gives the
/// alphabetical order encodeType requires for free.
fn referenced_types(name: &str, types: &Types) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![name.to_string()];

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(fields) = types.get(&current) {
            for field in fields {
                let base = base_type(&field.kind);
                if types.contains_key(base) && !seen.contains(base) {
                    stack.push(base.to_string());
                }
            }
        }
    }
    seen
}

/// `typeHash = keccak256(encodeType(name))`
pub fn type_hash(name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(encode_type(name, types)?.as_bytes()))
}

/// `hashStruct(s) = keccak256(typeHash || encodeData(s))`
pub fn struct_hash(
    name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(&encode_struct(name, value, types)?))
}

/// Hash of the `EIP712Domain` struct built from the fields present.
pub fn domain_separator(domain: &Eip712Domain, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let mut domain_types = types.clone();
    domain_types.insert("EIP712Domain".to_string(), domain.type_fields());

    let value = serde_json::to_value(domain).map_err(|e| Eip712Error::Json(e.to_string()))?;
    struct_hash("EIP712Domain", &value, &domain_types)
}

/// The 32-byte digest a wallet signs for this payload.
pub fn signing_digest(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    typed_data.validate()?;

    let separator = domain_separator(&typed_data.domain, &typed_data.types)?;
    let message_hash = struct_hash(&typed_data.primary_type, &typed_data.message, &typed_data.types)?;

    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.extend_from_slice(TYPED_DATA_PREFIX);
    preimage.extend_from_slice(&separator);
    preimage.extend_from_slice(&message_hash);
    Ok(keccak256(&preimage))
}

/// `typeHash || encodeData(value)` for a struct value.
fn encode_struct(
    name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    let object = value.as_object().ok_or_else(|| Eip712Error::ValueMismatch {
        kind: name.to_string(),
        value: value.to_string(),
    })?;
    let fields = types
        .get(name)
        .ok_or_else(|| Eip712Error::UnknownType(name.to_string()))?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(name, types)?);

    for field in fields {
        let field_value = object
            .get(&field.name)
            .ok_or_else(|| Eip712Error::MissingField(format!("{}.{}", name, field.name)))?;
        encoded.extend_from_slice(&encode_field(&field.kind, field_value, types)?);
    }
    Ok(encoded)
}

/// Encode one field to its 32-byte word: atomic values are padded in place,
/// dynamic values and nested structs/arrays contribute their hash.
fn encode_field(
    kind: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    if kind.contains('[') {
        return encode_array(kind, value, types);
    }
    if is_dynamic_type(kind) {
        return encode_dynamic(kind, value);
    }
    if types.contains_key(kind) {
        return struct_hash(kind, value, types);
    }
    encode_atomic(kind, value)
}

fn encode_array(
    kind: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    let items = value.as_array().ok_or_else(|| Eip712Error::ValueMismatch {
        kind: kind.to_string(),
        value: value.to_string(),
    })?;
    let element_kind = base_type(kind);

    let mut encoded = Vec::with_capacity(32 * items.len());
    for item in items {
        encoded.extend_from_slice(&encode_field(element_kind, item, types)?);
    }
    Ok(keccak256(&encoded))
}

fn encode_dynamic(kind: &str, value: &serde_json::Value) -> Result<[u8; 32], Eip712Error> {
    let text = value.as_str().ok_or_else(|| Eip712Error::ValueMismatch {
        kind: kind.to_string(),
        value: value.to_string(),
    })?;
    if kind == "bytes" {
        Ok(keccak256(&decode_hex(text)?))
    } else {
        Ok(keccak256(text.as_bytes()))
    }
}

fn encode_atomic(kind: &str, value: &serde_json::Value) -> Result<[u8; 32], Eip712Error> {
    let mut word = [0u8; 32];

    if kind == "address" {
        let text = value.as_str().ok_or_else(|| mismatch(kind, value))?;
        let bytes = crate::crypto::parse_address(text)
            .ok_or_else(|| Eip712Error::InvalidAddress(text.to_string()))?;
        word[12..].copy_from_slice(&bytes);
        return Ok(word);
    }

    if kind == "bool" {
        let flag = value.as_bool().ok_or_else(|| mismatch(kind, value))?;
        word[31] = flag as u8;
        return Ok(word);
    }

    if kind.starts_with("uint") || kind.starts_with("int") {
        if kind.starts_with("int") {
            if let Some(n) = value.as_i64() {
                if n < 0 {
                    // two's complement, sign-extended over 256 bits
                    word = [0xff; 32];
                    word[24..].copy_from_slice(&n.to_be_bytes());
                    return Ok(word);
                }
            }
        }
        let magnitude = parse_integer(kind, value)?;
        word[16..].copy_from_slice(&magnitude.to_be_bytes());
        return Ok(word);
    }

    if let Some(size) = kind.strip_prefix("bytes") {
        let size: usize = size
            .parse()
            .map_err(|_| Eip712Error::UnknownType(kind.to_string()))?;
        let text = value.as_str().ok_or_else(|| mismatch(kind, value))?;
        let bytes = decode_hex(text)?;
        if bytes.len() > size {
            return Err(mismatch(kind, value));
        }
        // fixed-size bytes are right-padded
        word[..bytes.len()].copy_from_slice(&bytes);
        return Ok(word);
    }

    Err(Eip712Error::UnknownType(kind.to_string()))
}

fn mismatch(kind: &str, value: &serde_json::Value) -> Eip712Error {
    Eip712Error::ValueMismatch { kind: kind.to_string(), value: value.to_string() }
}

/// Accept JSON numbers, decimal strings and 0x-prefixed hex strings.
fn parse_integer(kind: &str, value: &serde_json::Value) -> Result<u128, Eip712Error> {
    match value {
        serde_json::Value::Number(n) => {
            n.as_u64().map(u128::from).ok_or_else(|| mismatch(kind, value))
        }
        serde_json::Value::String(s) => {
            if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u128::from_str_radix(hex_part, 16).map_err(|_| mismatch(kind, value))
            } else {
                s.parse().map_err(|_| mismatch(kind, value))
            }
        }
        _ => Err(mismatch(kind, value)),
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>, Eip712Error> {
    let stripped = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(stripped).map_err(|e| Eip712Error::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_types() -> Types {
        let mut types = Types::new();
        types.insert(
            "Mail".to_string(),
            vec![
                TypedDataField::new("from", "Person"),
                TypedDataField::new("to", "Person"),
                TypedDataField::new("contents", "string"),
            ],
        );
        types.insert(
            "Person".to_string(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("wallet", "address"),
            ],
        );
        types
    }

    #[test]
    fn encode_type_flat_struct() {
        let mut types = Types::new();
        types.insert(
            "Person".to_string(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("wallet", "address"),
            ],
        );
        assert_eq!(
            encode_type("Person", &types).unwrap(),
            "Person(string name,address wallet)"
        );
    }

    #[test]
    fn encode_type_orders_dependencies() {
        assert_eq!(
            encode_type("Mail", &mail_types()).unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn missing_message_field_is_an_error() {
        let types = mail_types();
        let incomplete = serde_json::json!({ "from": { "name": "Cow" } });
        assert!(matches!(
            struct_hash("Person", &incomplete["from"], &types),
            Err(Eip712Error::MissingField(_))
        ));
    }

    #[test]
    fn uint_encodings_pad_left() {
        let word = encode_atomic("uint256", &serde_json::json!(1)).unwrap();
        assert_eq!(word[31], 1);
        assert!(word[..31].iter().all(|&b| b == 0));

        let word = encode_atomic("uint256", &serde_json::json!("0xff")).unwrap();
        assert_eq!(word[31], 0xff);
    }

    #[test]
    fn bool_and_address_encodings() {
        let word = encode_atomic("bool", &serde_json::json!(true)).unwrap();
        assert_eq!(word[31], 1);

        let word = encode_atomic(
            "address",
            &serde_json::json!("0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"),
        )
        .unwrap();
        assert_eq!(word[12], 0xCD);
        assert!(word[..12].iter().all(|&b| b == 0));
    }
}
