//! Display formatting for card numbers.
//!
//! Numbers are grouped the way each network embosses them: 4-6-5 for
//! American Express, 4-4-4-4 (continuing in fours) for everything else.
//! View bindings call this as the user types to re-render the field.

use crate::network::CardNetwork;

/// Formats a card number with the grouping of its detected network.
///
/// Existing separators are stripped first, so repeated formatting of an
/// already formatted value is stable.
///
/// # Example
///
/// ```
/// use cardform::format::format_card_number;
///
/// assert_eq!(format_card_number("4976000000003436"), "4976 0000 0000 3436");
/// assert_eq!(format_card_number("340000000000009"), "3400 000000 00009");
/// ```
pub fn format_card_number(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let network = CardNetwork::of_number(&digits);
    group_digits(&digits, network.number_groups())
}

impl CardNetwork {
    /// Digit group sizes for display formatting.
    pub(crate) const fn number_groups(&self) -> &'static [usize] {
        match self {
            Self::Amex => &[4, 6, 5],
            _ => &[4, 4, 4, 4, 4],
        }
    }
}

fn group_digits(digits: &str, groups: &[usize]) -> String {
    let mut result = String::with_capacity(digits.len() + groups.len());
    let mut remaining = digits;

    for &size in groups {
        if remaining.is_empty() {
            break;
        }
        if !result.is_empty() {
            result.push(' ');
        }
        let take = size.min(remaining.len());
        result.push_str(&remaining[..take]);
        remaining = &remaining[take..];
    }

    // Anything past the grouping table trails in one block
    if !remaining.is_empty() {
        result.push(' ');
        result.push_str(remaining);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visa_grouping() {
        assert_eq!(format_card_number("4976000000003436"), "4976 0000 0000 3436");
    }

    #[test]
    fn test_amex_grouping() {
        assert_eq!(format_card_number("340000000000009"), "3400 000000 00009");
    }

    #[test]
    fn test_partial_entry() {
        assert_eq!(format_card_number("49"), "49");
        assert_eq!(format_card_number("49760"), "4976 0");
        assert_eq!(format_card_number("3400000"), "3400 000");
    }

    #[test]
    fn test_reformat_is_stable() {
        let once = format_card_number("4976000000003436");
        assert_eq!(format_card_number(&once), once);
    }

    #[test]
    fn test_nineteen_digit_maestro() {
        assert_eq!(
            format_card_number("6759000000000000005"),
            "6759 0000 0000 0000 005"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(format_card_number(""), "");
    }
}
