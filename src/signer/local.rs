//! In-process key-backed signer
//!
//! Stands in for the injected wallet in the demo CLI and in tests. It signs
//! honestly with a locally held secp256k1 key and can be scripted to reject
//! requests the way a user declining the approval prompt would.

use super::{SignerError, SignerResult, WalletSigner};
use crate::crypto::{self, SignatureError};
use crate::eip712::{self, TypedData};
use crate::personal;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

/// Scripted outcome of the (virtual) approval prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Approval {
    #[default]
    Approve,
    Reject,
}

pub struct LocalSigner {
    secret: SecretKey,
    address: String,
    chain_id: u64,
    network_id: u64,
    approval: Approval,
    connected: bool,
}

impl LocalSigner {
    pub fn new(secret: SecretKey, chain_id: u64, network_id: u64) -> Self {
        let secp = Secp256k1::new();
        let address = crypto::checksum_address(&crypto::public_key_to_address(
            &PublicKey::from_secret_key(&secp, &secret),
        ));
        Self { secret, address, chain_id, network_id, approval: Approval::Approve, connected: false }
    }

    /// Generate a throwaway key from the OS RNG.
    pub fn random(chain_id: u64, network_id: u64) -> Self {
        let (secret, _) = Secp256k1::new().generate_keypair(&mut rand::rngs::OsRng);
        Self::new(secret, chain_id, network_id)
    }

    /// Build from a 32-byte secret in hex. The intermediate buffer is
    /// zeroized.
    pub fn from_secret_hex(secret_hex: &str, chain_id: u64, network_id: u64) -> SignerResult<Self> {
        let stripped = secret_hex
            .strip_prefix("0x")
            .or_else(|| secret_hex.strip_prefix("0X"))
            .unwrap_or(secret_hex);
        let bytes = Zeroizing::new(
            hex::decode(stripped).map_err(|e| SignerError::Signing(e.to_string()))?,
        );
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(Self::new(secret, chain_id, network_id))
    }

    /// Script the next approval prompts to approve or reject.
    pub fn set_approval(&mut self, approval: Approval) {
        self.approval = approval;
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn check_prompt(&self) -> SignerResult<()> {
        match self.approval {
            Approval::Approve => Ok(()),
            Approval::Reject => Err(SignerError::UserRejected),
        }
    }

    fn check_account(&self, account: &str) -> SignerResult<()> {
        if account.eq_ignore_ascii_case(&self.address) {
            Ok(())
        } else {
            Err(SignerError::UnknownAccount(account.to_string()))
        }
    }
}

impl From<SignatureError> for SignerError {
    fn from(e: SignatureError) -> Self {
        SignerError::Signing(e.to_string())
    }
}

impl WalletSigner for LocalSigner {
    fn request_accounts(&mut self) -> SignerResult<Vec<String>> {
        self.check_prompt()?;
        self.connected = true;
        Ok(vec![self.address.clone()])
    }

    fn accounts(&self) -> SignerResult<Vec<String>> {
        if self.connected {
            Ok(vec![self.address.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    fn chain_id(&self) -> SignerResult<u64> {
        Ok(self.chain_id)
    }

    fn network_id(&self) -> SignerResult<u64> {
        Ok(self.network_id)
    }

    fn sign_personal_message(&mut self, hex_message: &str, account: &str) -> SignerResult<String> {
        self.check_account(account)?;
        self.check_prompt()?;

        let message = personal::decode_hex_message(hex_message)?;
        let signature = personal::sign_personal(&message, &self.secret)?;
        Ok(signature.to_hex())
    }

    fn sign_typed_data_v4(&mut self, account: &str, typed_data: &TypedData) -> SignerResult<String> {
        self.check_account(account)?;
        self.check_prompt()?;

        let digest = eip712::signing_digest(typed_data)
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        let signature = crypto::sign_digest(&digest, &self.secret)?;
        Ok(signature.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn signer() -> LocalSigner {
        LocalSigner::from_secret_hex(TEST_SECRET, 1, 1).unwrap()
    }

    #[test]
    fn derives_checksummed_address() {
        assert_eq!(signer().address(), TEST_ADDRESS);
    }

    #[test]
    fn accounts_empty_until_connected() {
        let mut signer = signer();
        assert!(signer.accounts().unwrap().is_empty());

        signer.request_accounts().unwrap();
        assert_eq!(signer.accounts().unwrap(), vec![TEST_ADDRESS.to_string()]);
    }

    #[test]
    fn rejection_surfaces_as_user_rejected() {
        let mut signer = signer();
        signer.set_approval(Approval::Reject);
        assert!(matches!(
            signer.request_accounts(),
            Err(SignerError::UserRejected)
        ));
    }

    #[test]
    fn refuses_foreign_accounts() {
        let mut signer = signer();
        let result =
            signer.sign_personal_message("0x00", "0x1111111111111111111111111111111111111111");
        assert!(matches!(result, Err(SignerError::UnknownAccount(_))));
    }

    #[test]
    fn account_check_ignores_case() {
        let mut signer = signer();
        let lowercase = TEST_ADDRESS.to_lowercase();
        let signature = signer.sign_personal_message("0x01", &lowercase).unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132);
    }

    #[test]
    fn personal_signature_recovers_to_own_address() {
        let mut signer = signer();
        let message = b"check-in using tokenId 1";
        let hex_message = format!("0x{}", hex::encode(message));

        let signature = signer.sign_personal_message(&hex_message, TEST_ADDRESS).unwrap();
        let parsed = crypto::EcdsaSignature::from_hex(&signature).unwrap();
        assert_eq!(personal::recover_personal(message, &parsed).unwrap(), TEST_ADDRESS);
    }
}
