//! The checkin session controller
//!
//! Drives the dapp flow: connect, build the CheckIn payload for the active
//! account, request a signature from the signer, and verify the returned
//! signature by recovering the signing address. Verification compares
//! checksummed forms on both sides; raw-case comparison would wrongly
//! reject signers that report addresses in arbitrary case.

use crate::checkin::{self, PayloadError};
use crate::crypto::{self, EcdsaSignature, SignatureError};
use crate::eip712::{self, Eip712Error, TypedData};
use crate::personal;
use crate::session::{Session, SessionEvent};
use crate::signer::{SignerResult, WalletSigner};
use serde::Serialize;

/// Where the UI-facing flow currently stands. `Verified` and `Mismatched`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Disconnected,
    Connected,
    Signed,
    Verified,
    Mismatched,
}

/// Outcome of a signature verification. Both addresses are in checksummed
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    Verified(String),
    Mismatch { recovered: String, expected: String },
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyOutcome::Verified(_))
    }
}

/// Errors preventing a verification verdict. A mismatch is a verdict, not
/// an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] SignatureError),

    #[error("cannot hash payload: {0}")]
    Payload(#[from] Eip712Error),

    #[error("invalid expected account: {0}")]
    InvalidExpectedAccount(String),
}

/// Holds the session snapshot and runs the sign/verify call sequences
/// against a [`WalletSigner`].
pub struct CheckinController<S> {
    signer: S,
    session: Session,
    state: FlowState,
}

impl<S: WalletSigner> CheckinController<S> {
    pub fn new(signer: S) -> Self {
        Self { signer, session: Session::default(), state: FlowState::Disconnected }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn signer_mut(&mut self) -> &mut S {
        &mut self.signer
    }

    /// Request accounts and read the chain/network identifiers, producing
    /// the initial session snapshot.
    pub fn connect(&mut self) -> SignerResult<&Session> {
        let accounts = self.signer.request_accounts()?;
        let chain_id = self.signer.chain_id()?;
        let network_id = self.signer.network_id()?;

        self.session = Session::new(accounts, chain_id, network_id);
        if self.session.is_connected() {
            self.state = FlowState::Connected;
        }
        Ok(&self.session)
    }

    /// Fold a provider notification into the session. An empty account list
    /// drops the flow back to disconnected.
    pub fn handle_event(&mut self, event: SessionEvent) -> &Session {
        self.session = self.session.apply(&event);
        if !self.session.is_connected() {
            self.state = FlowState::Disconnected;
        }
        &self.session
    }

    /// Build the CheckIn payload for the active account on the session's
    /// effective chain.
    pub fn build_check_in_payload(&self) -> Result<TypedData, PayloadError> {
        let account = self.session.active_account().ok_or(PayloadError::NotConnected)?;
        checkin::build_check_in_payload(account, self.session.effective_chain_id())
    }

    /// Ask the signer for a typed-data-v4 signature. May block for an
    /// unbounded time while the approval prompt is open. The signature is
    /// returned unmodified.
    ///
    /// Chain or account changes racing this call are possible; callers
    /// should compare [`Self::session`] against the payload's domain before
    /// trusting the result.
    pub fn request_signature(&mut self, payload: &TypedData, account: &str) -> SignerResult<String> {
        let signature = self.signer.sign_typed_data_v4(account, payload)?;
        self.state = FlowState::Signed;
        Ok(signature)
    }

    /// Ask the signer for a personal-sign signature over raw message bytes.
    pub fn request_personal_signature(
        &mut self,
        message: &[u8],
        account: &str,
    ) -> SignerResult<String> {
        let hex_message = format!("0x{}", hex::encode(message));
        let signature = self.signer.sign_personal_message(&hex_message, account)?;
        self.state = FlowState::Signed;
        Ok(signature)
    }

    /// Verify a typed-data signature: recover the signer through the
    /// EIP-712 digest and compare checksummed addresses.
    pub fn verify_signature(
        &mut self,
        payload: &TypedData,
        signature_hex: &str,
        expected_account: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        let digest = eip712::signing_digest(payload)?;
        self.finish_verify(&digest, signature_hex, expected_account)
    }

    /// Verify a personal-sign signature through the prefixed-message digest.
    /// Distinct from [`Self::verify_signature`]; the two schemes never
    /// recover the same address for the same bytes.
    pub fn verify_personal_signature(
        &mut self,
        message: &[u8],
        signature_hex: &str,
        expected_account: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        let digest = personal::personal_sign_digest(message);
        self.finish_verify(&digest, signature_hex, expected_account)
    }

    fn finish_verify(
        &mut self,
        digest: &[u8; 32],
        signature_hex: &str,
        expected_account: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        let signature = EcdsaSignature::from_hex(signature_hex)?;
        let recovered = crypto::recover_digest(digest, &signature)?;

        let expected_bytes = crypto::parse_address(expected_account)
            .ok_or_else(|| VerifyError::InvalidExpectedAccount(expected_account.to_string()))?;
        let expected = crypto::checksum_address(&expected_bytes);

        let outcome = if recovered == expected {
            self.state = FlowState::Verified;
            VerifyOutcome::Verified(recovered)
        } else {
            self.state = FlowState::Mismatched;
            VerifyOutcome::Mismatch { recovered, expected }
        };
        Ok(outcome)
    }
}
