//! Countries offered for address verification (AVS) checks.

use std::fmt;

/// A country the user can select for AVS postcode collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    /// United Kingdom - alphanumeric postcodes
    UnitedKingdom,
    /// United States - numeric ZIP codes
    UnitedStates,
    /// Canada - alphanumeric postal codes
    Canada,
    /// Any other country; the postcode format is not checked.
    Other,
}

impl Country {
    /// All selectable countries, in the order the form presents them.
    pub const ALL: [Country; 4] = [
        Country::UnitedKingdom,
        Country::UnitedStates,
        Country::Canada,
        Country::Other,
    ];

    /// Whether the country's postal format is purely numeric.
    #[inline]
    pub const fn has_numeric_postcode(&self) -> bool {
        matches!(self, Self::UnitedStates)
    }

    /// The label the form shows for the postcode field.
    #[inline]
    pub const fn postcode_name(&self) -> &'static str {
        match self {
            Self::UnitedStates => "ZIP code",
            Self::Canada => "Postal code",
            _ => "Postcode",
        }
    }

    /// Display name.
    #[inline]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::UnitedKingdom => "UK",
            Self::UnitedStates => "USA",
            Self::Canada => "Canada",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_postcode_countries() {
        assert!(Country::UnitedStates.has_numeric_postcode());
        assert!(!Country::UnitedKingdom.has_numeric_postcode());
        assert!(!Country::Canada.has_numeric_postcode());
        assert!(!Country::Other.has_numeric_postcode());
    }

    #[test]
    fn test_postcode_names() {
        assert_eq!(Country::UnitedStates.postcode_name(), "ZIP code");
        assert_eq!(Country::UnitedKingdom.postcode_name(), "Postcode");
        assert_eq!(Country::Canada.postcode_name(), "Postal code");
    }

    #[test]
    fn test_display() {
        assert_eq!(Country::UnitedKingdom.to_string(), "UK");
        assert_eq!(Country::Other.to_string(), "Other");
    }
}
