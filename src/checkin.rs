//! The Eseats CheckIn payload
//!
//! The dapp signs one fixed message shape: a `CheckIn` for the "Webinar
//! Eseats" event, token 1, attended by the connected account. The type
//! declarations below are the wire format; verifiers must hash the exact
//! same field order to recover the same address.

use crate::eip712::{Eip712Domain, TypedData, TypedDataField};
use std::collections::HashMap;

pub const DOMAIN_NAME: &str = "Eseats";
pub const DOMAIN_VERSION: &str = "1";
pub const VERIFYING_CONTRACT: &str = "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC";
pub const PRIMARY_TYPE: &str = "CheckIn";
pub const EVENT_NAME: &str = "Webinar Eseats";
pub const TOKEN_ID: u64 = 1;

/// Errors building the payload.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PayloadError {
    #[error("attendee account must not be empty")]
    EmptyAccount,

    #[error("not connected to a signer")]
    NotConnected,
}

/// Build the canonical CheckIn payload for `account` on `chain_id`.
///
/// Pure and deterministic: `message.attendee` is exactly `account` and
/// `domain.chainId` is exactly `chain_id`.
pub fn build_check_in_payload(account: &str, chain_id: u64) -> Result<TypedData, PayloadError> {
    if account.is_empty() {
        return Err(PayloadError::EmptyAccount);
    }

    let mut types = HashMap::new();
    types.insert(
        "EIP712Domain".to_string(),
        vec![
            TypedDataField::new("name", "string"),
            TypedDataField::new("version", "string"),
            TypedDataField::new("chainId", "uint256"),
            TypedDataField::new("verifyingContract", "address"),
        ],
    );
    types.insert(
        PRIMARY_TYPE.to_string(),
        vec![
            TypedDataField::new("event", "string"),
            TypedDataField::new("tokenId", "uint256"),
            TypedDataField::new("attendee", "address"),
        ],
    );

    let domain = Eip712Domain {
        name: Some(DOMAIN_NAME.to_string()),
        version: Some(DOMAIN_VERSION.to_string()),
        chain_id: Some(serde_json::json!(chain_id)),
        verifying_contract: Some(VERIFYING_CONTRACT.to_string()),
        salt: None,
    };

    Ok(TypedData {
        types,
        primary_type: PRIMARY_TYPE.to_string(),
        domain,
        message: serde_json::json!({
            "event": EVENT_NAME,
            "tokenId": TOKEN_ID,
            "attendee": account,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip712;

    const ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn attendee_and_chain_id_come_from_inputs() {
        let payload = build_check_in_payload(ACCOUNT, 137).unwrap();
        assert_eq!(payload.message["attendee"], ACCOUNT);
        assert_eq!(payload.domain.chain_id_u64(), Some(137));
        assert_eq!(payload.primary_type, PRIMARY_TYPE);
        assert_eq!(payload.message["event"], EVENT_NAME);
        assert_eq!(payload.message["tokenId"], TOKEN_ID);
    }

    #[test]
    fn payload_is_deterministic() {
        let a = build_check_in_payload(ACCOUNT, 1).unwrap();
        let b = build_check_in_payload(ACCOUNT, 1).unwrap();
        assert_eq!(
            eip712::signing_digest(&a).unwrap(),
            eip712::signing_digest(&b).unwrap()
        );
    }

    #[test]
    fn empty_account_is_rejected() {
        assert!(matches!(
            build_check_in_payload("", 1),
            Err(PayloadError::EmptyAccount)
        ));
    }

    #[test]
    fn payload_passes_structural_validation() {
        let payload = build_check_in_payload(ACCOUNT, 1).unwrap();
        payload.validate().unwrap();
    }

    #[test]
    fn chain_id_changes_the_digest() {
        let mainnet = build_check_in_payload(ACCOUNT, 1).unwrap();
        let polygon = build_check_in_payload(ACCOUNT, 137).unwrap();
        assert_ne!(
            eip712::signing_digest(&mainnet).unwrap(),
            eip712::signing_digest(&polygon).unwrap()
        );
    }
}
