//! The transaction presenter state machine.
//!
//! One presenter drives one submission at a time through
//! `Idle → Submitting → {Success, Declined, ChallengeRequired, Failed}`,
//! with `ChallengeRequired → Authorizing → {Success, Declined}` when the
//! gateway demands 3-D Secure. Side effects (loading indicators, terminal
//! outcomes, challenge presentation) go to attached observers; observers
//! may come and go mid-flight without disturbing the network call, and
//! [`TransactionPresenter::reconnect`] replays the current state to
//! whoever is attached now.

use crate::card::CardDetails;
use crate::dedup::{DeduplicationGuard, Fingerprint};
use crate::error::{TransactionError, TransportError};
use crate::gateway::{
    ChallengeRequest, GatewayClient, Receipt, TransactionKind, TransactionRequest,
};
use crate::luhn;
use crate::secure3d::ChallengeOutcome;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Caller identifiers and behavior flags, fixed per presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Merchant account identifier (digits, checksummed).
    pub merchant_id: String,
    /// Transaction amount as a decimal string.
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Run the 3-D Secure challenge when the gateway asks for one;
    /// when disabled such receipts are treated as declines.
    pub three_d_secure_enabled: bool,
    /// Opaque device-signal map merged into every outgoing request.
    pub device_signals: HashMap<String, String>,
}

impl TransactionConfig {
    /// Creates a configuration with 3-D Secure enabled and no device
    /// signals.
    pub fn new(
        merchant_id: impl Into<String>,
        amount: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            amount: amount.into(),
            currency: currency.into(),
            three_d_secure_enabled: true,
            device_signals: HashMap::new(),
        }
    }

    /// Disables the 3-D Secure challenge step.
    pub fn without_three_d_secure(mut self) -> Self {
        self.three_d_secure_enabled = false;
        self
    }

    /// Attaches the device-signal map.
    pub fn with_device_signals(mut self, signals: HashMap<String, String>) -> Self {
        self.device_signals = signals;
        self
    }

    /// Checks the identifiers a submission cannot go out without. Runs
    /// before any network call.
    fn validate(&self) -> Result<(), TransactionError> {
        let id_digits: Vec<u8> = self
            .merchant_id
            .chars()
            .filter_map(|c| c.to_digit(10).map(|d| d as u8))
            .collect();
        if id_digits.len() != self.merchant_id.len() || !luhn::validate(&id_digits) {
            return Err(TransactionError::Configuration(format!(
                "merchant id '{}' is not a valid account number",
                self.merchant_id
            )));
        }

        match self.amount.trim().parse::<f64>() {
            Ok(value) if value > 0.0 => {}
            _ => {
                return Err(TransactionError::Configuration(format!(
                    "amount '{}' is not a positive number",
                    self.amount
                )))
            }
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(TransactionError::Configuration(format!(
                "currency '{}' is not an ISO 4217 code",
                self.currency
            )));
        }

        Ok(())
    }
}

/// A stored card usable for token payments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardToken {
    /// Gateway-issued card token.
    pub token: String,
    /// Expiry of the stored card, `MM/YY`.
    pub end_date: String,
    /// Last four digits, for display.
    pub last_four: String,
}

/// Where the current transaction stands.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionState {
    /// Nothing in flight.
    Idle,
    /// Waiting for the gateway's answer to the submission.
    Submitting,
    /// The gateway demanded 3-D Secure; waiting for the challenge result.
    ChallengeRequired(Receipt),
    /// Challenge result received; waiting for the final authorization.
    Authorizing {
        /// Receipt the challenge belongs to.
        receipt_id: String,
    },
    /// Terminal: approved.
    Success(Receipt),
    /// Terminal: declined by the gateway.
    Declined(Receipt),
    /// Terminal: failed without a business outcome (challenge mismatch).
    Failed(TransactionError),
}

impl TransactionState {
    fn in_flight(&self) -> bool {
        matches!(
            self,
            Self::Submitting | Self::ChallengeRequired(_) | Self::Authorizing { .. }
        )
    }
}

/// Receiver for the presenter's side effects.
///
/// All methods default to no-ops so an observer only implements what its
/// surface renders.
pub trait TransactionObserver: Send + Sync {
    /// A network operation started; show progress.
    fn show_loading(&self) {}
    /// The in-flight operation settled; hide progress.
    fn hide_loading(&self) {}
    /// Terminal success with the final receipt.
    fn transaction_completed(&self, _receipt: &Receipt) {}
    /// Terminal decline with the gateway's receipt.
    fn transaction_declined(&self, _receipt: &Receipt) {}
    /// Transport failure; the submission may be retried.
    fn connection_error(&self, _error: &TransportError) {}
    /// Present the redirect surface for a 3-D Secure challenge.
    fn present_challenge(&self, _challenge: &ChallengeRequest) {}
    /// The transaction failed without a receipt and cannot be retried.
    fn transaction_failed(&self, _error: &TransactionError) {}
}

struct Inner {
    state: TransactionState,
    reference: Option<String>,
    settled_references: HashSet<String>,
    observers: Vec<Arc<dyn TransactionObserver>>,
}

/// Drives submissions against a [`GatewayClient`].
pub struct TransactionPresenter<G: GatewayClient> {
    gateway: Arc<G>,
    guard: Arc<DeduplicationGuard>,
    config: TransactionConfig,
    inner: Mutex<Inner>,
}

impl<G: GatewayClient> TransactionPresenter<G> {
    /// Creates a presenter. The guard may be shared with other presenters
    /// so duplicate references are caught across the whole process.
    pub fn new(gateway: Arc<G>, guard: Arc<DeduplicationGuard>, config: TransactionConfig) -> Self {
        Self {
            gateway,
            guard,
            config,
            inner: Mutex::new(Inner {
                state: TransactionState::Idle,
                reference: None,
                settled_references: HashSet::new(),
                observers: Vec::new(),
            }),
        }
    }

    /// Attaches an observer; it starts receiving side effects immediately.
    pub fn attach(&self, observer: Arc<dyn TransactionObserver>) {
        self.inner.lock().observers.push(observer);
    }

    /// Detaches a previously attached observer.
    pub fn detach(&self, observer: &Arc<dyn TransactionObserver>) {
        // Compare data pointers only; vtable pointers are not stable
        let target = Arc::as_ptr(observer) as *const ();
        self.inner
            .lock()
            .observers
            .retain(|existing| Arc::as_ptr(existing) as *const () != target);
    }

    /// The current state, for rendering after re-attachment.
    pub fn state(&self) -> TransactionState {
        self.inner.lock().state.clone()
    }

    /// Submits freshly entered card details.
    ///
    /// Fails fast, without touching the state machine, when the
    /// configuration is unusable, a submission is already running, or the
    /// reference duplicates one that is in flight or already settled.
    pub async fn submit(
        &self,
        kind: TransactionKind,
        card: &CardDetails,
        reference: &str,
    ) -> Result<(), TransactionError> {
        let request = self.base_request(reference).with_card(card);
        self.dispatch(kind, reference, request).await
    }

    /// Submits a payment against a stored card token.
    pub async fn submit_token(
        &self,
        kind: TransactionKind,
        token: &CardToken,
        security_code: &str,
        reference: &str,
    ) -> Result<(), TransactionError> {
        let request = self.base_request(reference).with_token(
            token.token.clone(),
            token.end_date.clone(),
            token.last_four.clone(),
            security_code,
        );
        self.dispatch(kind, reference, request).await
    }

    /// Voids a previously authorized pre-auth.
    ///
    /// A plain passthrough: voiding is keyed by receipt id, not by the
    /// form, and does not move the state machine.
    pub async fn void_pre_auth(&self, receipt_id: &str) -> Result<Receipt, TransactionError> {
        info!(receipt_id, "voiding pre-auth");
        let receipt = self.gateway.void_pre_auth(receipt_id).await?;
        Ok(receipt)
    }

    /// Re-emits the current state to the attached observers without
    /// re-issuing any network request. Safe to call any number of times.
    pub fn reconnect(&self) {
        let (state, observers) = {
            let inner = self.inner.lock();
            (inner.state.clone(), inner.observers.clone())
        };

        for observer in &observers {
            match &state {
                TransactionState::Idle => observer.hide_loading(),
                TransactionState::Submitting | TransactionState::Authorizing { .. } => {
                    observer.show_loading()
                }
                TransactionState::ChallengeRequired(receipt) => {
                    observer.show_loading();
                    if let Some(challenge) = receipt.challenge_request() {
                        observer.present_challenge(&challenge);
                    }
                }
                TransactionState::Success(receipt) => {
                    observer.hide_loading();
                    observer.transaction_completed(receipt);
                }
                TransactionState::Declined(receipt) => {
                    observer.hide_loading();
                    observer.transaction_declined(receipt);
                }
                TransactionState::Failed(error) => {
                    observer.hide_loading();
                    observer.transaction_failed(error);
                }
            }
        }
    }

    /// Resumes the state machine with a 3-D Secure challenge result.
    ///
    /// The result must carry the receipt id the challenge was started
    /// with; anything else fails the transaction rather than being
    /// silently accepted.
    pub async fn on_challenge_result(
        &self,
        outcome: &ChallengeOutcome,
    ) -> Result<(), TransactionError> {
        let (receipt, reference) = {
            let mut inner = self.inner.lock();

            let receipt = match &inner.state {
                TransactionState::ChallengeRequired(receipt) => receipt.clone(),
                _ => return Err(TransactionError::NoChallengeInProgress),
            };

            if outcome.receipt_id != receipt.receipt_id {
                let error = TransactionError::ChallengeMismatch {
                    expected: receipt.receipt_id.clone(),
                    received: outcome.receipt_id.clone(),
                };
                warn!(%error, "challenge result rejected");
                inner.state = TransactionState::Failed(error.clone());
                if let Some(reference) = inner.reference.clone() {
                    inner.settled_references.insert(reference);
                }
                let observers = inner.observers.clone();
                drop(inner);

                for observer in &observers {
                    observer.hide_loading();
                    observer.transaction_failed(&error);
                }
                return Err(error);
            }

            inner.state = TransactionState::Authorizing {
                receipt_id: receipt.receipt_id.clone(),
            };
            (receipt, inner.reference.clone())
        };

        self.notify(|observer| observer.show_loading());

        if outcome.declined {
            info!(receipt_id = %receipt.receipt_id, "challenge declined by issuer");
            self.settle(reference, TransactionState::Declined(receipt.clone()));
            self.notify(|observer| {
                observer.hide_loading();
                observer.transaction_declined(&receipt);
            });
            return Ok(());
        }

        let result = self
            .gateway
            .authorize_three_d_secure(&receipt.receipt_id, outcome)
            .await;

        match result {
            Ok(final_receipt) if final_receipt.success => {
                info!(receipt_id = %final_receipt.receipt_id, "transaction authorized after challenge");
                self.settle(reference, TransactionState::Success(final_receipt.clone()));
                self.notify(|observer| {
                    observer.hide_loading();
                    observer.transaction_completed(&final_receipt);
                });
                Ok(())
            }
            Ok(final_receipt) => {
                info!(receipt_id = %final_receipt.receipt_id, "transaction declined after challenge");
                self.settle(reference, TransactionState::Declined(final_receipt.clone()));
                self.notify(|observer| {
                    observer.hide_loading();
                    observer.transaction_declined(&final_receipt);
                });
                Ok(())
            }
            Err(error) => {
                warn!(%error, "authorization call failed");
                self.settle(reference, TransactionState::Idle);
                self.notify(|observer| {
                    observer.hide_loading();
                    observer.connection_error(&error);
                });
                Err(error.into())
            }
        }
    }

    fn base_request(&self, reference: &str) -> TransactionRequest {
        TransactionRequest::new(
            self.config.merchant_id.clone(),
            self.config.amount.clone(),
            self.config.currency.clone(),
            reference,
        )
        .with_device_signals(self.config.device_signals.clone())
    }

    async fn dispatch(
        &self,
        kind: TransactionKind,
        reference: &str,
        request: TransactionRequest,
    ) -> Result<(), TransactionError> {
        self.config.validate()?;

        if reference.trim().is_empty() {
            return Err(TransactionError::Configuration(
                "consumer reference must not be empty".to_string(),
            ));
        }

        let fingerprint = Fingerprint::new(kind, reference);
        if !self.guard.try_acquire(&fingerprint) {
            return Err(TransactionError::DuplicateTransaction {
                reference: reference.to_string(),
            });
        }

        {
            let mut inner = self.inner.lock();

            if inner.state.in_flight() {
                self.guard.release(&fingerprint);
                return Err(TransactionError::AlreadyInProgress);
            }
            if inner.settled_references.contains(reference) {
                self.guard.release(&fingerprint);
                return Err(TransactionError::DuplicateTransaction {
                    reference: reference.to_string(),
                });
            }

            inner.state = TransactionState::Submitting;
            inner.reference = Some(reference.to_string());
        }

        info!(%kind, reference, "submitting transaction");
        self.notify(|observer| observer.show_loading());

        let result = match kind {
            TransactionKind::Payment => self.gateway.payment(request).await,
            TransactionKind::PreAuth => self.gateway.pre_auth(request).await,
            TransactionKind::RegisterCard => self.gateway.register_card(request).await,
        };
        self.guard.release(&fingerprint);

        match result {
            Ok(receipt) => self.resolve_receipt(reference, receipt),
            Err(error) => {
                warn!(%error, reference, "transaction transport failure");
                self.settle(Some(reference.to_string()), TransactionState::Idle);
                self.notify(|observer| {
                    observer.hide_loading();
                    observer.connection_error(&error);
                });
                Err(error.into())
            }
        }
    }

    fn resolve_receipt(&self, reference: &str, receipt: Receipt) -> Result<(), TransactionError> {
        if receipt.success {
            info!(receipt_id = %receipt.receipt_id, "transaction approved");
            self.settle(
                Some(reference.to_string()),
                TransactionState::Success(receipt.clone()),
            );
            self.notify(|observer| {
                observer.hide_loading();
                observer.transaction_completed(&receipt);
            });
            return Ok(());
        }

        if receipt.three_d_secure_required && self.config.three_d_secure_enabled {
            if let Some(challenge) = receipt.challenge_request() {
                info!(receipt_id = %receipt.receipt_id, "3-D Secure challenge required");
                self.inner.lock().state = TransactionState::ChallengeRequired(receipt.clone());
                self.notify(|observer| observer.present_challenge(&challenge));
                return Ok(());
            }
            warn!(
                receipt_id = %receipt.receipt_id,
                "challenge demanded without redirect parameters; treating as declined"
            );
        }

        info!(receipt_id = %receipt.receipt_id, result = ?receipt.result, "transaction declined");
        self.settle(
            Some(reference.to_string()),
            TransactionState::Declined(receipt.clone()),
        );
        self.notify(|observer| {
            observer.hide_loading();
            observer.transaction_declined(&receipt);
        });
        Ok(())
    }

    fn settle(&self, reference: Option<String>, state: TransactionState) {
        let mut inner = self.inner.lock();
        inner.state = state;
        if let Some(reference) = reference {
            inner.settled_references.insert(reference);
        }
    }

    fn notify(&self, f: impl Fn(&Arc<dyn TransactionObserver>)) {
        let observers = self.inner.lock().observers.clone();
        for observer in &observers {
            f(observer);
        }
    }
}
