//! Error taxonomy for form fields and transactions.
//!
//! Field-level problems are data, not `Err`: validators return structured
//! validity results carrying an optional [`FieldError`], and typing more
//! characters is always a valid recovery. Transaction-level failures are
//! real errors with distinct recovery rules, captured by
//! [`TransactionError`].

use crate::network::CardNetwork;
use thiserror::Error;

/// A field-level validation problem, rendered inline next to the field.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The card number fails its checksum or length rules.
    #[error("Check card number")]
    InvalidCardNumber,

    /// The card's network is recognized but not accepted under the
    /// current configuration.
    #[error("{} is not supported", .0.name())]
    NetworkNotSupported(CardNetwork),

    /// The date is malformed or outside its calendar bounds.
    #[error("Check date")]
    InvalidDate,

    /// The issue number is not a positive integer.
    #[error("Check issue number")]
    InvalidIssueNumber,

    /// The security code is not the length the network requires.
    #[error("Check security code")]
    InvalidSecurityCode,

    /// The postcode is empty or breaks the country's format.
    #[error("Check postcode")]
    InvalidPostcode,
}

/// A transport-level failure talking to the gateway, distinct from a
/// business decline encoded inside a receipt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The gateway could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The gateway answered with something that could not be read as a
    /// receipt.
    #[error("Unreadable gateway response: {0}")]
    UnexpectedResponse(String),
}

/// Failures of a submitted transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Required identifiers were missing or malformed; checked before any
    /// network call is made.
    #[error("Invalid transaction configuration: {0}")]
    Configuration(String),

    /// A submission with the same reference is already in flight or has
    /// already settled.
    #[error("Cannot make duplicate transaction with same unique ref: {reference}")]
    DuplicateTransaction {
        /// The reference that collided.
        reference: String,
    },

    /// The gateway could not be reached; retryable with a new reference.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 3-D Secure result arrived for a different receipt than the one
    /// the challenge was started with. Not retryable.
    #[error("3-D Secure result for receipt {received} does not match challenge receipt {expected}")]
    ChallengeMismatch {
        /// Receipt id the challenge was started with.
        expected: String,
        /// Receipt id carried by the result payload.
        received: String,
    },

    /// A 3-D Secure result was delivered while no challenge was pending.
    #[error("No 3-D Secure challenge in progress")]
    NoChallengeInProgress,

    /// A submission was attempted while another one is still running.
    #[error("A transaction is already in progress")]
    AlreadyInProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_messages() {
        assert_eq!(FieldError::InvalidCardNumber.to_string(), "Check card number");
        assert_eq!(
            FieldError::NetworkNotSupported(CardNetwork::Maestro).to_string(),
            "Maestro is not supported"
        );
        assert_eq!(
            FieldError::NetworkNotSupported(CardNetwork::Amex).to_string(),
            "American Express is not supported"
        );
    }

    #[test]
    fn test_duplicate_message_carries_reference() {
        let err = TransactionError::DuplicateTransaction {
            reference: "order-42".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot make duplicate transaction with same unique ref: order-42"
        );
    }

    #[test]
    fn test_transport_error_converts() {
        let err: TransactionError = TransportError::Connection("timed out".to_string()).into();
        assert!(matches!(err, TransactionError::Transport(_)));
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FieldError>();
        assert_send_sync::<TransportError>();
        assert_send_sync::<TransactionError>();
    }
}
