//! # cardform
//!
//! Payment card form validation and transaction orchestration.
//!
//! The crate has two halves. The validation half turns each keystroke on a
//! card entry form into a fresh, fully recomputed view model: per-field
//! errors, section visibility, a submit gate and a focus-advance target.
//! The orchestration half drives a submitted form through a remote payment
//! gateway, including the optional 3-D Secure challenge performed in a
//! redirect-capturing browser surface, while guarding against duplicate
//! submissions.
//!
//! Rendering, HTTP transport and the browser surface itself stay outside:
//! callers implement [`GatewayClient`] and feed the
//! [`ThreeDSecureBridge`](secure3d::ThreeDSecureBridge) raw page events.
//!
//! ## Validating a form
//!
//! ```rust
//! use cardform::form::{validate_form, Field, FormConfig, FormSnapshot};
//! use cardform::CardNetwork;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
//! let config = FormConfig::default();
//!
//! // Each keystroke builds a new snapshot
//! let snapshot = FormSnapshot::new()
//!     .with_card_number("4976000000003436")
//!     .with_focus(Some(Field::CardNumber));
//!
//! let validation = validate_form(&snapshot, &config, today);
//! assert_eq!(validation.network, CardNetwork::Visa);
//! assert!(!validation.submit_enabled);
//! // The completed number moves focus on to the expiry date
//! assert_eq!(validation.focus_advance, Some(Field::ExpiryDate));
//!
//! let snapshot = snapshot
//!     .with_expiry_date("12/25")
//!     .with_security_code("452");
//! assert!(validate_form(&snapshot, &config, today).submit_enabled);
//! ```
//!
//! ## Driving a transaction
//!
//! The presenter owns the submit → receipt → (3-D Secure) → outcome
//! lifecycle. See [`presenter::TransactionPresenter`]; the integration
//! tests walk the full flow against a mock gateway.
//!
//! ## Security
//!
//! - Card numbers and security codes are zeroed on drop
//! - `Debug`/`Display` implementations only show masked numbers
//! - Nothing in this crate logs card data unmasked

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod card;
pub mod country;
pub mod dedup;
pub mod error;
pub mod expiry;
pub mod form;
pub mod format;
pub mod gateway;
pub mod luhn;
pub mod mask;
pub mod network;
pub mod presenter;
pub mod secure3d;
pub mod validate;

// Re-export main types at crate root
pub use card::{Address, CardDetails};
pub use country::Country;
pub use dedup::{DeduplicationGuard, Fingerprint};
pub use error::{FieldError, TransactionError, TransportError};
pub use form::{validate_form, Field, FormConfig, FormSnapshot, FormValidation};
pub use gateway::{
    ChallengeRequest, GatewayClient, Receipt, TransactionKind, TransactionRequest,
};
pub use network::CardNetwork;
pub use presenter::{
    CardToken, TransactionConfig, TransactionObserver, TransactionPresenter, TransactionState,
};
pub use secure3d::{BridgeSignal, ChallengeOutcome, PageEvent, ThreeDSecureBridge};
