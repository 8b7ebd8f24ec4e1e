//! Typed-data structures and validation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One field of a struct type declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    pub name: String,
    /// Solidity type name, e.g. "address", "uint256", or a declared struct.
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into() }
    }
}

/// The EIP-712 signing domain. Only fields that are present participate in
/// the domain separator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Wallets report chain ids both as numbers and as hex strings
    /// ("0x1"), so this stays a raw JSON value until hashed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// The chain id as an integer, accepting decimal numbers, decimal
    /// strings, and 0x-prefixed hex strings.
    pub fn chain_id_u64(&self) -> Option<u64> {
        match self.chain_id.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => {
                if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    u64::from_str_radix(hex_part, 16).ok()
                } else {
                    s.parse().ok()
                }
            }
            _ => None,
        }
    }

    /// The declared fields of `EIP712Domain`, in canonical order, for the
    /// fields actually present.
    pub fn type_fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }
        fields
    }
}

/// A complete typed-data payload in the `eth_signTypedData_v4` wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub types: HashMap<String, Vec<TypedDataField>>,
    pub primary_type: String,
    pub domain: Eip712Domain,
    pub message: serde_json::Value,
}

impl TypedData {
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::Json(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::Json(e.to_string()))
    }

    /// Check that the primary type is declared and that every referenced
    /// type resolves to a builtin or a declared struct.
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if !self.types.contains_key(&self.primary_type) {
            return Err(Eip712Error::UnknownPrimaryType(self.primary_type.clone()));
        }

        for fields in self.types.values() {
            for field in fields {
                let base = base_type(&field.kind);
                if !is_atomic_type(base)
                    && !is_dynamic_type(base)
                    && !self.types.contains_key(base)
                {
                    return Err(Eip712Error::UnknownType(field.kind.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Errors from hashing or recovering typed data.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Eip712Error {
    #[error("invalid typed data JSON: {0}")]
    Json(String),

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("primary type not declared: {0}")]
    UnknownPrimaryType(String),

    #[error("missing message field: {0}")]
    MissingField(String),

    #[error("value {value} does not fit type {kind}")]
    ValueMismatch { kind: String, value: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex data: {0}")]
    InvalidHex(String),

    #[error("signature error: {0}")]
    Signature(String),
}

/// Strip array suffixes: `Person[]` -> `Person`, `uint256[3]` -> `uint256`.
pub fn base_type(kind: &str) -> &str {
    match kind.find('[') {
        Some(pos) => &kind[..pos],
        None => kind,
    }
}

/// Fixed-size builtin types: address, bool, uintN/intN, bytesN.
pub fn is_atomic_type(kind: &str) -> bool {
    if kind == "address" || kind == "bool" {
        return true;
    }
    if let Some(bits) = kind.strip_prefix("uint").or_else(|| kind.strip_prefix("int")) {
        if let Ok(n) = bits.parse::<u32>() {
            return n > 0 && n <= 256 && n % 8 == 0;
        }
        return false;
    }
    if kind != "bytes" {
        if let Some(size) = kind.strip_prefix("bytes") {
            if let Ok(n) = size.parse::<u32>() {
                return n > 0 && n <= 32;
            }
        }
    }
    false
}

/// Variable-length builtin types, hashed rather than padded.
pub fn is_dynamic_type(kind: &str) -> bool {
    kind == "bytes" || kind == "string"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_type_classification() {
        assert!(is_atomic_type("address"));
        assert!(is_atomic_type("bool"));
        assert!(is_atomic_type("uint256"));
        assert!(is_atomic_type("int8"));
        assert!(is_atomic_type("bytes32"));

        assert!(!is_atomic_type("uint"));
        assert!(!is_atomic_type("uint257"));
        assert!(!is_atomic_type("bytes0"));
        assert!(!is_atomic_type("bytes33"));
        assert!(!is_atomic_type("string"));
        assert!(!is_atomic_type("bytes"));
    }

    #[test]
    fn base_type_strips_arrays() {
        assert_eq!(base_type("Person[]"), "Person");
        assert_eq!(base_type("uint256[3]"), "uint256");
        assert_eq!(base_type("address"), "address");
    }

    #[test]
    fn chain_id_accepts_number_and_hex() {
        let mut domain = Eip712Domain::default();
        domain.chain_id = Some(serde_json::json!(1));
        assert_eq!(domain.chain_id_u64(), Some(1));

        domain.chain_id = Some(serde_json::json!("0x89"));
        assert_eq!(domain.chain_id_u64(), Some(137));

        domain.chain_id = Some(serde_json::json!("42"));
        assert_eq!(domain.chain_id_u64(), Some(42));
    }

    #[test]
    fn validate_rejects_undeclared_primary_type() {
        let data = TypedData {
            types: HashMap::new(),
            primary_type: "CheckIn".to_string(),
            domain: Eip712Domain::default(),
            message: serde_json::json!({}),
        };
        assert!(matches!(
            data.validate(),
            Err(Eip712Error::UnknownPrimaryType(_))
        ));
    }
}
