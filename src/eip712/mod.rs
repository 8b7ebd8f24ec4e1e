//! EIP-712 typed structured data
//!
//! Hashing and address recovery for typed-data-v4 payloads, per
//! <https://eips.ethereum.org/EIPS/eip-712>. The wire shape (`types`,
//! `primaryType`, `domain`, `message`) matches what wallets accept for
//! `eth_signTypedData_v4`, so payloads hashed here verify interoperably.

pub mod hash;
pub mod types;

pub use hash::{domain_separator, encode_type, signing_digest, struct_hash, type_hash};
pub use types::{Eip712Domain, Eip712Error, TypedData, TypedDataField};

use crate::crypto::{self, EcdsaSignature, SignatureError};

/// Recover the checksummed address that signed `typed_data`.
pub fn recover_typed_data(
    typed_data: &TypedData,
    signature: &EcdsaSignature,
) -> Result<String, Eip712Error> {
    let digest = signing_digest(typed_data)?;
    crypto::recover_digest(&digest, signature).map_err(Eip712Error::from)
}

impl From<SignatureError> for Eip712Error {
    fn from(e: SignatureError) -> Self {
        Eip712Error::Signature(e.to_string())
    }
}
