//! Card details captured from the entry form.
//!
//! `CardDetails` is the value handed to the transaction presenter on
//! submission. The full number and security code are sensitive: both are
//! zeroed on drop, and `Debug`/`Display` only ever show a masked number.

use crate::country::Country;
use crate::mask;
use crate::network::CardNetwork;
use std::fmt;
use zeroize::Zeroize;

/// Cardholder address fields collected when AVS is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Selected country.
    pub country: Country,
    /// Postcode as entered.
    pub postcode: String,
}

/// The card data entered on the form, as submitted.
#[derive(Clone)]
pub struct CardDetails {
    number: String,
    security_code: String,
    expiry_date: String,
    start_date: Option<String>,
    issue_number: Option<String>,
    address: Option<Address>,
}

impl CardDetails {
    /// Creates card details from the three fields every network requires.
    pub fn new(
        number: impl Into<String>,
        expiry_date: impl Into<String>,
        security_code: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            expiry_date: expiry_date.into(),
            security_code: security_code.into(),
            start_date: None,
            issue_number: None,
            address: None,
        }
    }

    /// Attaches the Maestro start date and issue number.
    pub fn with_issue_details(
        mut self,
        start_date: impl Into<String>,
        issue_number: impl Into<String>,
    ) -> Self {
        self.start_date = Some(start_date.into());
        self.issue_number = Some(issue_number.into());
        self
    }

    /// Attaches the AVS address.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// The full card number.
    ///
    /// Exposed for request building only; never log this. Use
    /// [`CardDetails::masked_number`] for anything user- or log-facing.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// The security code.
    pub fn security_code(&self) -> &str {
        &self.security_code
    }

    /// The expiry date as entered (`MM/YY`).
    pub fn expiry_date(&self) -> &str {
        &self.expiry_date
    }

    /// The Maestro start date, if collected.
    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    /// The Maestro issue number, if collected.
    pub fn issue_number(&self) -> Option<&str> {
        self.issue_number.as_deref()
    }

    /// The AVS address, if collected.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// The network detected from the number.
    pub fn network(&self) -> CardNetwork {
        CardNetwork::of_number(&self.number)
    }

    /// Last four digits of the number, for receipts and saved-card display.
    pub fn last_four(&self) -> String {
        mask::last_four(&self.number)
    }

    /// The number masked down to its last four digits.
    pub fn masked_number(&self) -> String {
        mask::mask_number(&self.number)
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.masked_number())
            .field("security_code", &"***")
            .field("expiry_date", &self.expiry_date)
            .field("start_date", &self.start_date)
            .field("issue_number", &self.issue_number)
            .field("address", &self.address)
            .finish()
    }
}

impl Drop for CardDetails {
    fn drop(&mut self) {
        self.number.zeroize();
        self.security_code.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_number() {
        let card = CardDetails::new("4976000000003436", "12/25", "452");
        assert_eq!(card.network(), CardNetwork::Visa);
    }

    #[test]
    fn test_last_four() {
        let card = CardDetails::new("4976 0000 0000 3436", "12/25", "452");
        assert_eq!(card.last_four(), "3436");
    }

    #[test]
    fn test_debug_is_masked() {
        let card = CardDetails::new("4976000000003436", "12/25", "452");
        let debug = format!("{:?}", card);
        assert!(!debug.contains("4976000000003436"));
        assert!(!debug.contains("452"));
        assert!(debug.contains("3436"));
    }

    #[test]
    fn test_issue_details() {
        let card = CardDetails::new("6759000000005462", "12/25", "789")
            .with_issue_details("01/20", "1");
        assert_eq!(card.start_date(), Some("01/20"));
        assert_eq!(card.issue_number(), Some("1"));
    }

    #[test]
    fn test_address() {
        let card = CardDetails::new("4976000000003436", "12/25", "452").with_address(Address {
            country: Country::UnitedKingdom,
            postcode: "TR14 8PA".to_string(),
        });
        assert_eq!(card.address().unwrap().postcode, "TR14 8PA");
    }
}
