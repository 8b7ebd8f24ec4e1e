//! Shared Ethereum signing primitives
//!
//! Keccak-256 hashing, recoverable ECDSA over secp256k1, address derivation
//! and EIP-55 checksum encoding. Both the typed-data and the personal-message
//! paths sit on top of this module; only the digest they sign differs.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Errors raised while parsing or recovering a signature
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid signature hex: {0}")]
    InvalidHex(String),

    #[error("invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("address recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// A 65-byte recoverable ECDSA signature in Ethereum's `r || s || v` layout.
///
/// `v` is the recovery id offset by 27, as wallets return it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl EcdsaSignature {
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Parse from raw bytes (`r || s || v`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, v: bytes[64] })
    }

    /// Parse from a hex string, with or without the `0x` prefix.
    pub fn from_hex(hex_sig: &str) -> Result<Self, SignatureError> {
        let stripped = hex_sig
            .strip_prefix("0x")
            .or_else(|| hex_sig.strip_prefix("0X"))
            .unwrap_or(hex_sig);
        let bytes =
            hex::decode(stripped).map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Normalize `v` to a secp256k1 recovery id. Accepts both the legacy
    /// 27/28 convention and a raw 0..=3 id.
    fn recovery_id(&self) -> Result<RecoveryId, SignatureError> {
        let id = if self.v >= 27 { self.v - 27 } else { self.v };
        if id > 3 {
            return Err(SignatureError::InvalidRecoveryId(self.v));
        }
        RecoveryId::from_i32(id as i32)
            .map_err(|_| SignatureError::InvalidRecoveryId(self.v))
    }
}

/// Sign a 32-byte digest, returning a recoverable signature with v = 27/28.
pub fn sign_digest(digest: &[u8; 32], secret_key: &SecretKey) -> Result<EcdsaSignature, SignatureError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)
        .map_err(|e| SignatureError::InvalidDigest(e.to_string()))?;

    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[0..32]);
    s.copy_from_slice(&compact[32..64]);

    Ok(EcdsaSignature::new(r, s, recovery_id.to_i32() as u8 + 27))
}

/// Recover the checksummed signer address from a digest and its signature.
pub fn recover_digest(digest: &[u8; 32], signature: &EcdsaSignature) -> Result<String, SignatureError> {
    let secp = Secp256k1::new();
    let recovery_id = signature.recovery_id()?;

    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&signature.r);
    compact[32..64].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    let message = Message::from_digest_slice(digest)
        .map_err(|e| SignatureError::InvalidDigest(e.to_string()))?;

    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    Ok(checksum_address(&public_key_to_address(&public_key)))
}

/// Derive the 20-byte Ethereum address from a secp256k1 public key.
pub fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    // keccak256 of the uncompressed key minus the 0x04 tag, last 20 bytes
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

/// Encode an address with the EIP-55 mixed-case checksum.
pub fn checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        if c.is_ascii_digit() {
            out.push(c);
        } else {
            let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
            out.push(if nibble >= 8 { c.to_ascii_uppercase() } else { c });
        }
    }
    out
}

/// Parse a hex address (any case, optional `0x`) into its 20 raw bytes.
pub fn parse_address(address: &str) -> Option<[u8; 20]> {
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if stripped.len() != 40 {
        return None;
    }
    let bytes = hex::decode(stripped).ok()?;

    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Some(out)
}
