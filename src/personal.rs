//! EIP-191 personal messages
//!
//! `personal_sign` prefixes the raw message with
//! `"\x19Ethereum Signed Message:\n" + len` before hashing, which is a
//! different digest scheme from typed data. The two must never be mixed:
//! a signature over one scheme recovers to a different address under the
//! other.

use crate::crypto::{self, EcdsaSignature, SignatureError};
use secp256k1::SecretKey;

const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// The digest signed by `personal_sign` for a raw message.
pub fn personal_sign_digest(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", PERSONAL_MESSAGE_PREFIX, message.len());
    let mut preimage = Vec::with_capacity(prefix.len() + message.len());
    preimage.extend_from_slice(prefix.as_bytes());
    preimage.extend_from_slice(message);
    crypto::keccak256(&preimage)
}

/// Sign a raw message under the personal-sign scheme.
pub fn sign_personal(message: &[u8], secret_key: &SecretKey) -> Result<EcdsaSignature, SignatureError> {
    crypto::sign_digest(&personal_sign_digest(message), secret_key)
}

/// Recover the checksummed address that personal-signed `message`.
pub fn recover_personal(
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<String, SignatureError> {
    crypto::recover_digest(&personal_sign_digest(message), signature)
}

/// Decode the 0x-prefixed hex form wallets pass personal messages in.
pub fn decode_hex_message(hex_message: &str) -> Result<Vec<u8>, SignatureError> {
    let stripped = hex_message
        .strip_prefix("0x")
        .or_else(|| hex_message.strip_prefix("0X"))
        .unwrap_or(hex_message);
    hex::decode(stripped).map_err(|e| SignatureError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat's first well-known development account
    const TEST_SECRET: [u8; 32] = [
        0xac, 0x09, 0x74, 0xbe, 0xc3, 0x9a, 0x17, 0xe3, 0x6b, 0xa4, 0xa6, 0xb4, 0xd2, 0x38,
        0xff, 0x94, 0x4b, 0xac, 0xb4, 0x78, 0xcb, 0xed, 0x5e, 0xfc, 0xae, 0x78, 0x4d, 0x7b,
        0xf4, 0xf2, 0xff, 0x80,
    ];
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn digest_is_prefixed_and_deterministic() {
        let a = personal_sign_digest(b"check-in using tokenId 1");
        let b = personal_sign_digest(b"check-in using tokenId 1");
        assert_eq!(a, b);

        // prefix binds the length, so a different message changes the digest
        assert_ne!(a, personal_sign_digest(b"check-in using tokenId 2"));
    }

    #[test]
    fn sign_and_recover_round_trips() {
        let secret = SecretKey::from_slice(&TEST_SECRET).unwrap();
        let message = b"check-in using tokenId 1";

        let signature = sign_personal(message, &secret).unwrap();
        let recovered = recover_personal(message, &signature).unwrap();
        assert_eq!(recovered, TEST_ADDRESS);
    }

    #[test]
    fn personal_digest_differs_from_raw_keccak() {
        let message = b"check-in using tokenId 1";
        assert_ne!(personal_sign_digest(message), crypto::keccak256(message));
    }

    #[test]
    fn hex_message_decoding() {
        assert_eq!(decode_hex_message("0x48656c6c6f").unwrap(), b"Hello");
        assert!(decode_hex_message("0xnot-hex").is_err());
    }

    #[test]
    fn empty_message_still_recovers() {
        let secret = SecretKey::from_slice(&TEST_SECRET).unwrap();
        let signature = sign_personal(b"", &secret).unwrap();
        assert_eq!(recover_personal(b"", &signature).unwrap(), TEST_ADDRESS);
    }
}
