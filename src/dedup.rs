//! Duplicate-submission protection.
//!
//! Every outgoing transaction is identified by a fingerprint of its
//! operation and idempotency reference. The guard holds the fingerprints
//! of requests currently in flight; a second submission with the same
//! fingerprint fails fast instead of producing a second network call. The
//! fingerprint is released once the first request settles (success,
//! decline or transport error), after which the reference may be used
//! again.

use crate::gateway::TransactionKind;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Identity of an outgoing request: operation plus idempotency reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: TransactionKind,
    reference: String,
}

impl Fingerprint {
    /// Builds the fingerprint for a submission.
    pub fn new(kind: TransactionKind, reference: impl Into<String>) -> Self {
        Self {
            kind,
            reference: reference.into(),
        }
    }

    /// The idempotency reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.reference)
    }
}

/// Tracks in-flight request fingerprints.
///
/// Acquire and release go through a single mutex-protected set, so two
/// racing submissions for the same reference can never both proceed.
#[derive(Debug, Default)]
pub struct DeduplicationGuard {
    in_flight: Mutex<HashSet<Fingerprint>>,
}

impl DeduplicationGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim a fingerprint. Returns false if an identical
    /// request is already in flight.
    pub fn try_acquire(&self, fingerprint: &Fingerprint) -> bool {
        let acquired = self.in_flight.lock().insert(fingerprint.clone());
        if !acquired {
            debug!(%fingerprint, "duplicate submission rejected");
        }
        acquired
    }

    /// Releases a fingerprint once its request has settled.
    pub fn release(&self, fingerprint: &Fingerprint) {
        self.in_flight.lock().remove(fingerprint);
    }

    /// Whether a request with this fingerprint is currently outstanding.
    pub fn is_in_flight(&self, fingerprint: &Fingerprint) -> bool {
        self.in_flight.lock().contains(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(reference: &str) -> Fingerprint {
        Fingerprint::new(TransactionKind::Payment, reference)
    }

    #[test]
    fn test_acquire_then_duplicate_rejected() {
        let guard = DeduplicationGuard::new();
        let fingerprint = payment("order-1");

        assert!(guard.try_acquire(&fingerprint));
        assert!(!guard.try_acquire(&fingerprint));
        assert!(guard.is_in_flight(&fingerprint));
    }

    #[test]
    fn test_release_allows_reuse() {
        let guard = DeduplicationGuard::new();
        let fingerprint = payment("order-1");

        assert!(guard.try_acquire(&fingerprint));
        guard.release(&fingerprint);
        assert!(!guard.is_in_flight(&fingerprint));
        assert!(guard.try_acquire(&fingerprint));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let guard = DeduplicationGuard::new();

        assert!(guard.try_acquire(&payment("order-1")));
        assert!(guard.try_acquire(&Fingerprint::new(TransactionKind::PreAuth, "order-1")));
    }

    #[test]
    fn test_concurrent_acquire_admits_exactly_one() {
        use std::sync::Arc;

        let guard = Arc::new(DeduplicationGuard::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let guard = Arc::clone(&guard);
            handles.push(std::thread::spawn(move || {
                guard.try_acquire(&Fingerprint::new(TransactionKind::Payment, "order-1"))
            }));
        }

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|acquired| *acquired)
            .count();
        assert_eq!(admitted, 1);
    }
}
