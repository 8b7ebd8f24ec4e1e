//! Eseats checkin signing core
//!
//! The wallet-facing logic of the Eseats checkin dapp: session tracking,
//! the fixed `CheckIn` EIP-712 payload, signature requests against an
//! external signer, and verification by address recovery.
//!
//! # Architecture
//!
//! - **session**: immutable session snapshots plus an event reducer and
//!   ordered change subscriptions
//! - **signer**: the external signer capability and an in-process
//!   key-backed implementation
//! - **checkin**: the canonical CheckIn payload builder
//! - **eip712**: typed-data hashing and address recovery
//! - **personal**: EIP-191 personal-message signing and recovery
//! - **controller**: the connect → sign → verify flow
//!
//! # Example
//!
//! ```rust,ignore
//! use eseats_checkin::{CheckinController, LocalSigner};
//!
//! let mut controller = CheckinController::new(LocalSigner::random(1, 1));
//! let session = controller.connect()?;
//! let account = session.active_account().unwrap().to_string();
//!
//! let payload = controller.build_check_in_payload()?;
//! let signature = controller.request_signature(&payload, &account)?;
//! let outcome = controller.verify_signature(&payload, &signature, &account)?;
//! assert!(outcome.is_verified());
//! ```

pub mod checkin;
pub mod controller;
pub mod crypto;
pub mod eip712;
pub mod personal;
pub mod session;
pub mod signer;

pub use checkin::{build_check_in_payload, PayloadError};
pub use controller::{CheckinController, FlowState, VerifyError, VerifyOutcome};
pub use crypto::{checksum_address, keccak256, EcdsaSignature, SignatureError};
pub use eip712::{Eip712Domain, Eip712Error, TypedData, TypedDataField};
pub use session::{Session, SessionEvent, SessionWatcher, Subscription};
pub use signer::{Approval, LocalSigner, NoSigner, SignerError, WalletSigner};
