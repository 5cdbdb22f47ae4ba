//! Per-field validators.
//!
//! Each validator turns the raw text of one form field into a structured
//! validity result. Validators never fail: bad input produces a result
//! carrying an error, and further typing is always the recovery. Errors are
//! only flagged for display once entry of the field is complete, so a
//! half-typed number is never shouted at.

use crate::country::Country;
use crate::error::FieldError;
use crate::expiry::{self, parse_card_date};
use crate::form::FormConfig;
use crate::luhn;
use crate::network::CardNetwork;
use chrono::NaiveDate;

/// Validity of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldState {
    /// The field's current value passes all of its rules.
    pub valid: bool,
    /// The rule the value currently breaks, if any.
    pub error: Option<FieldError>,
    /// Whether the error should be rendered inline right now.
    pub show_error: bool,
    /// The user has typed enough characters for the field to be judged.
    pub entry_complete: bool,
}

impl FieldState {
    fn valid_complete() -> Self {
        Self {
            valid: true,
            error: None,
            show_error: false,
            entry_complete: true,
        }
    }
}

/// Result of validating the card number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardNumberValidation {
    /// Network detected from the current prefix.
    pub network: CardNetwork,
    /// Field validity.
    pub state: FieldState,
}

/// Validates the card number as typed so far.
///
/// In token mode the field holds a display-only masked number and is
/// always valid. Otherwise the number must pass the Luhn checksum and have
/// a length the detected network accepts. A network excluded by
/// configuration (Amex or Maestro without their flags) is reported as soon
/// as the prefix identifies it, overriding the checksum error.
pub fn validate_card_number(text: &str, config: &FormConfig) -> CardNumberValidation {
    let digits: Vec<u8> = text
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| d as u8))
        .collect();
    let network = CardNetwork::of_digits(&digits);

    if config.token_mode {
        return CardNumberValidation {
            network,
            state: FieldState::valid_complete(),
        };
    }

    let entry_complete = digits.len() >= network.minimum_length();

    if network != CardNetwork::Unknown
        && !network.is_supported(config.amex_enabled, config.maestro_enabled)
    {
        return CardNumberValidation {
            network,
            state: FieldState {
                valid: false,
                error: Some(FieldError::NetworkNotSupported(network)),
                show_error: true,
                entry_complete,
            },
        };
    }

    let valid = luhn::validate(&digits) && network.accepts_length(digits.len());
    let error = (!valid).then_some(FieldError::InvalidCardNumber);

    CardNumberValidation {
        network,
        state: FieldState {
            valid,
            error,
            show_error: entry_complete && !valid,
            entry_complete,
        },
    }
}

/// Validates the security code against the detected network's length.
pub fn validate_security_code(text: &str, network: CardNetwork) -> FieldState {
    let digit_count = text.chars().filter(|c| c.is_ascii_digit()).count();
    let required = network.security_code_length();

    let valid = digit_count == required && text.chars().all(|c| c.is_ascii_digit());
    let entry_complete = digit_count >= required;
    let error = (!valid).then_some(FieldError::InvalidSecurityCode);

    FieldState {
        valid,
        error,
        show_error: entry_complete && !valid,
        entry_complete,
    }
}

/// Validates the expiry date field at the given clock.
pub fn validate_expiry_date(text: &str, today: NaiveDate) -> FieldState {
    validate_date(text, |date| date.is_valid_expiry(today))
}

/// Validates the Maestro start date field at the given clock.
pub fn validate_start_date(text: &str, today: NaiveDate) -> FieldState {
    validate_date(text, |date| date.is_valid_start(today))
}

fn validate_date(text: &str, check: impl Fn(crate::expiry::CardDate) -> bool) -> FieldState {
    let entry_complete = expiry::is_entry_complete(text);
    let valid = match parse_card_date(text) {
        Ok(date) => check(date),
        Err(_) => false,
    };
    let error = (!valid).then_some(FieldError::InvalidDate);

    FieldState {
        valid,
        error,
        show_error: entry_complete && !valid,
        entry_complete,
    }
}

/// Validates the Maestro issue number: a base-10 integer greater than
/// zero. The field never renders an inline error; an invalid value just
/// keeps the submit gate closed.
pub fn validate_issue_number(text: &str) -> FieldState {
    let valid = matches!(text.trim().parse::<u32>(), Ok(n) if n > 0);
    let error = (!valid).then_some(FieldError::InvalidIssueNumber);

    FieldState {
        valid,
        error,
        show_error: false,
        entry_complete: valid,
    }
}

/// Result of validating the postcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostcodeValidation {
    /// A country eligible for AVS is selected; when false the postcode
    /// field is hidden entirely rather than showing an error.
    pub country_selected: bool,
    /// Field validity.
    pub state: FieldState,
}

/// Validates the postcode for the selected country.
///
/// The postcode must be non-empty; countries with purely numeric postal
/// formats additionally reject non-digits. With no country selected the
/// result reports `country_selected: false` and no postcode error.
pub fn validate_postcode(text: &str, country: Option<Country>) -> PostcodeValidation {
    let Some(country) = country else {
        return PostcodeValidation {
            country_selected: false,
            state: FieldState::default(),
        };
    };

    let trimmed = text.trim();
    let entry_complete = !trimmed.is_empty();

    let format_ok = if country.has_numeric_postcode() {
        trimmed.chars().all(|c| c.is_ascii_digit())
    } else {
        trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    };
    let valid = entry_complete && format_ok;
    let error = (!valid).then_some(FieldError::InvalidPostcode);

    PostcodeValidation {
        country_selected: true,
        state: FieldState {
            valid,
            error,
            show_error: entry_complete && !valid,
            entry_complete,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormConfig {
        FormConfig {
            amex_enabled: true,
            maestro_enabled: true,
            ..FormConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 11, 1).unwrap()
    }

    #[test]
    fn test_card_number_valid_visa() {
        let result = validate_card_number("4976000000003436", &config());
        assert_eq!(result.network, CardNetwork::Visa);
        assert!(result.state.valid);
        assert!(result.state.entry_complete);
        assert!(!result.state.show_error);
    }

    #[test]
    fn test_card_number_no_error_while_typing() {
        let result = validate_card_number("4976", &config());
        assert!(!result.state.valid);
        assert!(!result.state.entry_complete);
        assert!(!result.state.show_error);
    }

    #[test]
    fn test_card_number_bad_checksum_shown_when_complete() {
        let result = validate_card_number("4976000000003437", &config());
        assert!(!result.state.valid);
        assert!(result.state.entry_complete);
        assert!(result.state.show_error);
        assert_eq!(result.state.error, Some(FieldError::InvalidCardNumber));
    }

    #[test]
    fn test_unsupported_network_shown_immediately() {
        let mut cfg = config();
        cfg.maestro_enabled = false;

        // Two digits are enough to identify Maestro
        let result = validate_card_number("67", &cfg);
        assert_eq!(result.network, CardNetwork::Maestro);
        assert!(result.state.show_error);
        assert_eq!(
            result.state.error,
            Some(FieldError::NetworkNotSupported(CardNetwork::Maestro))
        );
    }

    #[test]
    fn test_unsupported_overrides_checksum_error() {
        let mut cfg = config();
        cfg.amex_enabled = false;

        let result = validate_card_number("340000000000009", &cfg);
        assert_eq!(
            result.state.error,
            Some(FieldError::NetworkNotSupported(CardNetwork::Amex))
        );
    }

    #[test]
    fn test_token_mode_accepts_masked_number() {
        let mut cfg = config();
        cfg.token_mode = true;

        let result = validate_card_number("****-****-****-3436", &cfg);
        assert!(result.state.valid);
        assert!(result.state.entry_complete);
    }

    #[test]
    fn test_visa_thirteen_digits_accepted() {
        // 13 is an accepted Visa length; entry is complete from there
        let result = validate_card_number("4222222222222", &config());
        assert_eq!(result.network, CardNetwork::Visa);
        assert!(result.state.valid);
    }

    #[test]
    fn test_visa_fourteen_digits_rejected() {
        // Luhn-correct but 14 digits is not a Visa length
        let mut digits = vec![4u8, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2];
        digits.push(crate::luhn::check_digit(&digits));
        let text: String = digits.iter().map(|d| (b'0' + d) as char).collect();

        let result = validate_card_number(&text, &config());
        assert!(!result.state.valid);
        assert!(result.state.show_error);
    }

    #[test]
    fn test_security_code_lengths() {
        assert!(validate_security_code("452", CardNetwork::Visa).valid);
        assert!(!validate_security_code("45", CardNetwork::Visa).valid);
        assert!(!validate_security_code("45", CardNetwork::Visa).show_error);

        assert!(validate_security_code("4527", CardNetwork::Amex).valid);
        assert!(!validate_security_code("452", CardNetwork::Amex).valid);
    }

    #[test]
    fn test_expiry_date_boundary() {
        assert!(validate_expiry_date("12/20", today()).valid);
        assert!(!validate_expiry_date("12/20", NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()).valid);
    }

    #[test]
    fn test_expiry_incomplete_entry_is_silent() {
        let state = validate_expiry_date("12/2", today());
        assert!(!state.valid);
        assert!(!state.show_error);
    }

    #[test]
    fn test_start_date() {
        assert!(validate_start_date("01/18", today()).valid);
        assert!(!validate_start_date("01/21", today()).valid);
        assert!(validate_start_date("01/21", today()).show_error);
    }

    #[test]
    fn test_issue_number() {
        assert!(validate_issue_number("1").valid);
        assert!(validate_issue_number("12").valid);
        assert!(!validate_issue_number("0").valid);
        assert!(!validate_issue_number("").valid);
        assert!(!validate_issue_number("abc").valid);
        assert!(!validate_issue_number("-1").valid);
        assert!(!validate_issue_number("abc").show_error);
    }

    #[test]
    fn test_postcode_requires_country() {
        let result = validate_postcode("TR14 8PA", None);
        assert!(!result.country_selected);
        assert!(!result.state.valid);
        assert!(!result.state.show_error);
    }

    #[test]
    fn test_postcode_numeric_country() {
        let result = validate_postcode("90210", Some(Country::UnitedStates));
        assert!(result.state.valid);

        let result = validate_postcode("ABC12", Some(Country::UnitedStates));
        assert!(!result.state.valid);
        assert!(result.state.show_error);
    }

    #[test]
    fn test_postcode_alphanumeric_country() {
        assert!(validate_postcode("TR14 8PA", Some(Country::UnitedKingdom)).state.valid);
        assert!(validate_postcode("K1A 0B1", Some(Country::Canada)).state.valid);
        assert!(!validate_postcode("", Some(Country::UnitedKingdom)).state.valid);
        assert!(validate_postcode("12345", Some(Country::Other)).state.valid);
    }
}
