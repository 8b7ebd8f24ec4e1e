//! The external signer capability
//!
//! [`WalletSigner`] models the injected provider surface the dapp talks to:
//! account discovery, chain/network identifiers, and the two signing
//! methods. Signing may block indefinitely while a human considers the
//! approval prompt; there is no timeout or cancellation, a caller can only
//! discard the pending result.

pub mod local;

pub use local::{Approval, LocalSigner};

use crate::eip712::TypedData;

/// Errors surfaced by a signer. All are recoverable; the caller may retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    #[error("no signer is available")]
    Unavailable,

    #[error("the user rejected the request")]
    UserRejected,

    #[error("account not held by this signer: {0}")]
    UnknownAccount(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// The provider operations the checkin flow needs.
pub trait WalletSigner {
    /// Prompt for connection approval and return the exposed accounts.
    fn request_accounts(&mut self) -> SignerResult<Vec<String>>;

    /// The already-exposed accounts, without prompting.
    fn accounts(&self) -> SignerResult<Vec<String>>;

    fn chain_id(&self) -> SignerResult<u64>;

    fn network_id(&self) -> SignerResult<u64>;

    /// `personal_sign` over a 0x-prefixed hex message. Returns the hex
    /// signature.
    fn sign_personal_message(&mut self, hex_message: &str, account: &str) -> SignerResult<String>;

    /// `eth_signTypedData_v4`. Returns the hex signature over the payload's
    /// EIP-712 digest, unmodified.
    fn sign_typed_data_v4(&mut self, account: &str, typed_data: &TypedData) -> SignerResult<String>;
}

/// The "no injected wallet" case: every operation fails with
/// [`SignerError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSigner;

impl WalletSigner for NoSigner {
    fn request_accounts(&mut self) -> SignerResult<Vec<String>> {
        Err(SignerError::Unavailable)
    }

    fn accounts(&self) -> SignerResult<Vec<String>> {
        Err(SignerError::Unavailable)
    }

    fn chain_id(&self) -> SignerResult<u64> {
        Err(SignerError::Unavailable)
    }

    fn network_id(&self) -> SignerResult<u64> {
        Err(SignerError::Unavailable)
    }

    fn sign_personal_message(&mut self, _hex_message: &str, _account: &str) -> SignerResult<String> {
        Err(SignerError::Unavailable)
    }

    fn sign_typed_data_v4(&mut self, _account: &str, _typed_data: &TypedData) -> SignerResult<String> {
        Err(SignerError::Unavailable)
    }
}
