//! Form snapshot and the aggregate validation pass.
//!
//! Every keystroke produces a fresh [`FormSnapshot`]; [`validate_form`] is
//! a pure function from a snapshot (plus configuration and clock) to a
//! [`FormValidation`] describing what each field should render, which
//! sections are visible, whether the submit button is enabled, and where
//! focus should move next. Running it twice on the same snapshot yields the
//! same answer.

use crate::card::{Address, CardDetails};
use crate::country::Country;
use crate::network::CardNetwork;
use crate::validate::{
    validate_card_number, validate_expiry_date, validate_issue_number, validate_postcode,
    validate_security_code, validate_start_date, FieldState,
};
use chrono::NaiveDate;

/// Static form configuration, fixed for the lifetime of the form.
///
/// This replaces process-wide toggles: the same snapshot under a different
/// configuration may validate differently, and both results are
/// reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormConfig {
    /// Collect and verify the cardholder's country and postcode.
    pub avs_enabled: bool,
    /// Accept American Express cards.
    pub amex_enabled: bool,
    /// Accept Maestro cards (enables the start date and issue number
    /// fields).
    pub maestro_enabled: bool,
    /// The card number field holds a display-only masked token number.
    pub token_mode: bool,
    /// Network of the stored token; the masked display number cannot be
    /// used for detection, so token mode takes the network from here.
    pub token_network: Option<CardNetwork>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            avs_enabled: false,
            amex_enabled: true,
            maestro_enabled: false,
            token_mode: false,
            token_network: None,
        }
    }
}

/// The form's input fields, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Card number entry.
    CardNumber,
    /// Maestro start date.
    StartDate,
    /// Maestro issue number.
    IssueNumber,
    /// Expiry date.
    ExpiryDate,
    /// Security code.
    SecurityCode,
    /// AVS postcode.
    Postcode,
}

/// An immutable snapshot of everything the user has entered.
///
/// Field changes never mutate a snapshot in place; each change builds a
/// new one via the `with_*` methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    card_number: String,
    expiry_date: String,
    security_code: String,
    start_date: String,
    issue_number: String,
    country: Option<Country>,
    postcode: String,
    focused: Option<Field>,
}

impl FormSnapshot {
    /// An empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot with the card number replaced.
    pub fn with_card_number(mut self, value: impl Into<String>) -> Self {
        self.card_number = value.into();
        self
    }

    /// Returns a snapshot with the expiry date replaced.
    pub fn with_expiry_date(mut self, value: impl Into<String>) -> Self {
        self.expiry_date = value.into();
        self
    }

    /// Returns a snapshot with the security code replaced.
    pub fn with_security_code(mut self, value: impl Into<String>) -> Self {
        self.security_code = value.into();
        self
    }

    /// Returns a snapshot with the start date replaced.
    pub fn with_start_date(mut self, value: impl Into<String>) -> Self {
        self.start_date = value.into();
        self
    }

    /// Returns a snapshot with the issue number replaced.
    pub fn with_issue_number(mut self, value: impl Into<String>) -> Self {
        self.issue_number = value.into();
        self
    }

    /// Returns a snapshot with the AVS country replaced.
    pub fn with_country(mut self, country: Option<Country>) -> Self {
        self.country = country;
        self
    }

    /// Returns a snapshot with the postcode replaced.
    pub fn with_postcode(mut self, value: impl Into<String>) -> Self {
        self.postcode = value.into();
        self
    }

    /// Returns a snapshot with the focused field replaced.
    pub fn with_focus(mut self, field: Option<Field>) -> Self {
        self.focused = field;
        self
    }

    /// The card number as typed.
    pub fn card_number(&self) -> &str {
        &self.card_number
    }

    /// The expiry date as typed.
    pub fn expiry_date(&self) -> &str {
        &self.expiry_date
    }

    /// The security code as typed.
    pub fn security_code(&self) -> &str {
        &self.security_code
    }

    /// The start date as typed.
    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    /// The issue number as typed.
    pub fn issue_number(&self) -> &str {
        &self.issue_number
    }

    /// The selected AVS country.
    pub fn country(&self) -> Option<Country> {
        self.country
    }

    /// The postcode as typed.
    pub fn postcode(&self) -> &str {
        &self.postcode
    }

    /// The field currently holding input focus.
    pub fn focused(&self) -> Option<Field> {
        self.focused
    }

    /// Builds the submission payload from the entered values, including
    /// only the sections the configuration collects.
    pub fn card_details(&self, config: &FormConfig) -> CardDetails {
        let network = CardNetwork::of_number(&self.card_number);
        let mut details = CardDetails::new(
            self.card_number.clone(),
            self.expiry_date.clone(),
            self.security_code.clone(),
        );

        if config.maestro_enabled && network.collects_issue_details() {
            details = details.with_issue_details(self.start_date.clone(), self.issue_number.clone());
        }

        if config.avs_enabled {
            if let Some(country) = self.country {
                details = details.with_address(Address {
                    country,
                    postcode: self.postcode.trim().to_string(),
                });
            }
        }

        details
    }
}

/// Everything the view needs to render the form after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValidation {
    /// Network detected from the card number prefix.
    pub network: CardNetwork,
    /// Card number field state.
    pub card_number: FieldState,
    /// Expiry date field state.
    pub expiry_date: FieldState,
    /// Security code field state.
    pub security_code: FieldState,
    /// Start date field state; meaningful only when issue details are
    /// visible.
    pub start_date: FieldState,
    /// Issue number field state; meaningful only when issue details are
    /// visible.
    pub issue_number: FieldState,
    /// Postcode field state; meaningful only when the postcode is visible.
    pub postcode: FieldState,
    /// Show the start date and issue number section (Maestro only).
    pub issue_details_visible: bool,
    /// Show the expiry date field (hidden in token mode, where the token
    /// carries its own end date).
    pub expiry_visible: bool,
    /// Show the country and postcode section (AVS only).
    pub avs_visible: bool,
    /// Show the postcode entry itself; false while no country is selected.
    pub postcode_visible: bool,
    /// Every visible field is valid; submission may proceed.
    pub submit_enabled: bool,
    /// Field that should receive focus now that the focused field is
    /// complete, if any. Focus only ever advances, never regresses.
    pub focus_advance: Option<Field>,
}

/// Validates a snapshot under a configuration, judging dates against
/// `today`.
///
/// # Example
///
/// ```
/// use cardform::form::{validate_form, FormConfig, FormSnapshot};
/// use chrono::NaiveDate;
///
/// let snapshot = FormSnapshot::new()
///     .with_card_number("4976000000003436")
///     .with_expiry_date("12/25")
///     .with_security_code("452");
/// let today = NaiveDate::from_ymd_opt(2020, 11, 1).unwrap();
///
/// let validation = validate_form(&snapshot, &FormConfig::default(), today);
/// assert!(validation.submit_enabled);
/// ```
pub fn validate_form(
    snapshot: &FormSnapshot,
    config: &FormConfig,
    today: NaiveDate,
) -> FormValidation {
    let number = validate_card_number(&snapshot.card_number, config);
    let network = if config.token_mode {
        config.token_network.unwrap_or(number.network)
    } else {
        number.network
    };

    let issue_details_visible =
        !config.token_mode && config.maestro_enabled && network.collects_issue_details();
    let expiry_visible = !config.token_mode;
    let avs_visible = config.avs_enabled;

    let expiry_date = validate_expiry_date(&snapshot.expiry_date, today);
    let security_code = validate_security_code(&snapshot.security_code, network);
    let start_date = validate_start_date(&snapshot.start_date, today);
    let issue_number = validate_issue_number(&snapshot.issue_number);
    let postcode = validate_postcode(&snapshot.postcode, snapshot.country);
    let postcode_visible = avs_visible && postcode.country_selected;

    let mut submit_enabled = number.state.valid && security_code.valid;
    if expiry_visible {
        submit_enabled &= expiry_date.valid;
    }
    if issue_details_visible {
        submit_enabled &= start_date.valid && issue_number.valid;
    }
    if avs_visible {
        // An unselected country closes the gate without surfacing a
        // postcode error.
        submit_enabled &= postcode.country_selected && postcode.state.valid;
    }

    let validation = FormValidation {
        network,
        card_number: number.state,
        expiry_date,
        security_code,
        start_date,
        issue_number,
        postcode: postcode.state,
        issue_details_visible,
        expiry_visible,
        avs_visible,
        postcode_visible,
        submit_enabled,
        focus_advance: None,
    };

    let focus_advance = advance_target(snapshot.focused, &validation);
    FormValidation {
        focus_advance,
        ..validation
    }
}

/// Fixed focus order, filtered down to the visible fields.
fn focus_order(validation: &FormValidation) -> Vec<Field> {
    let mut order = Vec::with_capacity(6);
    order.push(Field::CardNumber);
    if validation.issue_details_visible {
        order.push(Field::StartDate);
        order.push(Field::IssueNumber);
    }
    if validation.expiry_visible {
        order.push(Field::ExpiryDate);
    }
    order.push(Field::SecurityCode);
    if validation.postcode_visible {
        order.push(Field::Postcode);
    }
    order
}

fn advance_target(focused: Option<Field>, validation: &FormValidation) -> Option<Field> {
    let focused = focused?;

    let state = match focused {
        Field::CardNumber => validation.card_number,
        Field::StartDate => validation.start_date,
        Field::IssueNumber => validation.issue_number,
        Field::ExpiryDate => validation.expiry_date,
        Field::SecurityCode => validation.security_code,
        Field::Postcode => validation.postcode,
    };

    if !state.entry_complete || state.error.is_some() {
        return None;
    }

    let order = focus_order(validation);
    let position = order.iter().position(|f| *f == focused)?;
    order.get(position + 1).copied()
}
