//! Card network detection from number prefixes.
//!
//! The first few digits of a card number (the IIN) identify the network.
//! Detection always re-evaluates from the full current prefix, so a partial
//! entry that momentarily matches one network is corrected as more digits
//! arrive, and a settled match stays stable for the rest of the number.

use std::fmt;

/// A payment card network, detected from the card number prefix.
///
/// Each network carries the metadata the form needs: accepted number
/// lengths, security code length and label, and whether acceptance is
/// gated behind a configuration flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardNetwork {
    /// Visa - prefix 4, lengths 13, 16, 19
    Visa,
    /// Mastercard - prefix 51-55 or 2221-2720, length 16
    Mastercard,
    /// American Express - prefix 34, 37, length 15
    Amex,
    /// Maestro - prefix 50, 56-69, lengths 12-19
    Maestro,
    /// No known network matches the prefix.
    Unknown,
}

impl CardNetwork {
    /// Detects the network from the digits typed so far.
    ///
    /// Spaces and hyphens are ignored. An empty or unrecognized prefix
    /// yields [`CardNetwork::Unknown`].
    ///
    /// # Example
    ///
    /// ```
    /// use cardform::CardNetwork;
    ///
    /// assert_eq!(CardNetwork::of_number("4976"), CardNetwork::Visa);
    /// assert_eq!(CardNetwork::of_number("4976 0000 0000 3436"), CardNetwork::Visa);
    /// assert_eq!(CardNetwork::of_number("6759"), CardNetwork::Maestro);
    /// ```
    pub fn of_number(number: &str) -> Self {
        let mut digits = [0u8; 6];
        let mut count = 0;

        for c in number.chars() {
            if let Some(d) = c.to_digit(10) {
                digits[count] = d as u8;
                count += 1;
                if count == digits.len() {
                    break;
                }
            }
        }

        Self::of_digits(&digits[..count])
    }

    /// Detects the network from a pre-parsed digit prefix.
    ///
    /// Order matters for overlapping ranges: Mastercard 51-55 is matched
    /// before the Maestro 5x ranges.
    pub fn of_digits(digits: &[u8]) -> Self {
        match digits {
            // Mastercard: 51-55
            [5, 1..=5, ..] => Self::Mastercard,

            // Mastercard: 2221-2720
            [2, 2, 2, 1..=9, ..] => Self::Mastercard,
            [2, 2, 3..=9, _, ..] => Self::Mastercard,
            [2, 3..=6, _, _, ..] => Self::Mastercard,
            [2, 7, 0..=1, _, ..] => Self::Mastercard,
            [2, 7, 2, 0, ..] => Self::Mastercard,

            // American Express: 34, 37
            [3, 4, ..] | [3, 7, ..] => Self::Amex,

            // Visa: 4
            [4, ..] => Self::Visa,

            // Maestro: 50, 56-59, 60-69
            [5, 0, ..] => Self::Maestro,
            [5, 6..=9, ..] => Self::Maestro,
            [6, ..] => Self::Maestro,

            _ => Self::Unknown,
        }
    }

    /// Card number lengths the network accepts.
    #[inline]
    pub const fn accepted_lengths(&self) -> &'static [u8] {
        match self {
            Self::Visa => &[13, 16, 19],
            Self::Mastercard => &[16],
            Self::Amex => &[15],
            Self::Maestro | Self::Unknown => &[12, 13, 14, 15, 16, 17, 18, 19],
        }
    }

    /// Returns true if `length` is an accepted card number length.
    #[inline]
    pub const fn accepts_length(&self, length: usize) -> bool {
        let accepted = self.accepted_lengths();
        let mut i = 0;
        while i < accepted.len() {
            if accepted[i] as usize == length {
                return true;
            }
            i += 1;
        }
        false
    }

    /// The shortest accepted card number length; entry is considered
    /// complete once this many digits have been typed.
    #[inline]
    pub const fn minimum_length(&self) -> usize {
        match self {
            Self::Visa => 13,
            Self::Mastercard => 16,
            Self::Amex => 15,
            Self::Maestro | Self::Unknown => 12,
        }
    }

    /// Number of digits in the security code (Amex uses 4, others 3).
    #[inline]
    pub const fn security_code_length(&self) -> usize {
        match self {
            Self::Amex => 4,
            _ => 3,
        }
    }

    /// The label the network prints next to its security code.
    #[inline]
    pub const fn security_code_name(&self) -> &'static str {
        match self {
            Self::Amex => "CID",
            Self::Visa => "CVV2",
            Self::Mastercard => "CVC2",
            _ => "CVV",
        }
    }

    /// Whether the form collects a start date and issue number for this
    /// network.
    #[inline]
    pub const fn collects_issue_details(&self) -> bool {
        matches!(self, Self::Maestro)
    }

    /// Whether this network can be accepted under the given configuration
    /// flags. Amex and Maestro acceptance is opt-in; everything else is
    /// always eligible.
    #[inline]
    pub const fn is_supported(&self, amex_enabled: bool, maestro_enabled: bool) -> bool {
        match self {
            Self::Amex => amex_enabled,
            Self::Maestro => maestro_enabled,
            _ => true,
        }
    }

    /// Human-readable network name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::Mastercard => "Mastercard",
            Self::Amex => "American Express",
            Self::Maestro => "Maestro",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
