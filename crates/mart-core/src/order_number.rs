//! # Order Number Formatting & Parsing
//!
//! Human-readable order identifiers of the form `<PREFIX>-<YEAR>-<SEQ>`.
//!
//! ## Format
//! ```text
//! MA-2025-001
//! │    │    │
//! │    │    └── Sequence within the year, zero-padded to 3 digits
//! │    │        (widens automatically past 999: MA-2025-1000)
//! │    └─────── Calendar year the order was placed
//! └──────────── Store prefix (uppercase letters)
//! ```
//!
//! ## Where The Sequence Comes From
//! This module only formats and parses. The sequence itself is issued by an
//! atomic per-year counter in the database layer - never by scanning
//! existing orders for a maximum, which loses races between concurrent
//! checkouts.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Minimum zero-padded width of the sequence component.
pub const MIN_SEQ_WIDTH: usize = 3;

/// A parsed order identifier.
///
/// ## Example
/// ```rust
/// use mart_core::order_number::OrderNumber;
///
/// let n = OrderNumber::new("MA", 2025, 42);
/// assert_eq!(n.to_string(), "MA-2025-042");
///
/// let parsed = OrderNumber::parse("MA-2025-042").unwrap();
/// assert_eq!(parsed, n);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNumber {
    pub prefix: String,
    pub year: i32,
    pub sequence: u32,
}

impl OrderNumber {
    /// Creates an order number from its components.
    pub fn new(prefix: impl Into<String>, year: i32, sequence: u32) -> Self {
        OrderNumber {
            prefix: prefix.into(),
            year,
            sequence,
        }
    }

    /// Parses an identifier string.
    ///
    /// ## Accepted Pattern
    /// `PREFIX-YEAR-SEQ` where PREFIX is 1-8 uppercase ASCII letters, YEAR
    /// is exactly 4 digits, and SEQ is at least [`MIN_SEQ_WIDTH`] digits.
    ///
    /// ## Errors
    /// `ValidationError::InvalidFormat` when the string deviates from the
    /// pattern in any way.
    pub fn parse(s: &str) -> Result<OrderNumber, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "order_number".to_string(),
            reason: reason.to_string(),
        };

        let mut parts = s.split('-');
        let (prefix, year, seq) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(y), Some(q), None) => (p, y, q),
            _ => return Err(invalid("expected PREFIX-YEAR-SEQ")),
        };

        if prefix.is_empty()
            || prefix.len() > 8
            || !prefix.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(invalid("prefix must be 1-8 uppercase letters"));
        }

        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("year must be exactly 4 digits"));
        }

        if seq.len() < MIN_SEQ_WIDTH || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("sequence must be at least 3 digits"));
        }

        let year: i32 = year.parse().map_err(|_| invalid("year out of range"))?;
        let sequence: u32 = seq.parse().map_err(|_| invalid("sequence out of range"))?;

        if sequence == 0 {
            return Err(invalid("sequence starts at 1"));
        }

        Ok(OrderNumber::new(prefix, year, sequence))
    }

    /// Checks whether the identifier was issued in the current year.
    pub fn is_current_year(&self, now: DateTime<Utc>) -> bool {
        self.year == now.year()
    }
}

/// Formats as `PREFIX-YEAR-SEQ` with the sequence zero-padded to 3 digits.
impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}-{:03}", self.prefix, self.year, self.sequence)
    }
}

/// Convenience formatter used by checkout once the counter issues a sequence.
pub fn format_order_number(prefix: &str, year: i32, sequence: u32) -> String {
    OrderNumber::new(prefix, year, sequence).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_zero_padded() {
        assert_eq!(format_order_number("MA", 2025, 1), "MA-2025-001");
        assert_eq!(format_order_number("MA", 2025, 42), "MA-2025-042");
        assert_eq!(format_order_number("MA", 2025, 150), "MA-2025-150");
    }

    #[test]
    fn test_format_widens_past_999() {
        assert_eq!(format_order_number("MA", 2025, 1000), "MA-2025-1000");
        assert_eq!(format_order_number("MA", 2025, 12345), "MA-2025-12345");
    }

    #[test]
    fn test_parse_roundtrip() {
        for seq in [1u32, 9, 99, 100, 999, 1000, 65000] {
            let formatted = format_order_number("MA", 2025, seq);
            let parsed = OrderNumber::parse(&formatted).unwrap();
            assert_eq!(parsed, OrderNumber::new("MA", 2025, seq));
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "MA",
            "MA-2025",
            "MA-2025-001-extra",
            "ma-2025-001",    // lowercase prefix
            "MA-25-001",      // short year
            "MA-20255-001",   // long year
            "MA-2025-01",     // short sequence
            "MA-2025-0xA",    // non-digit sequence
            "MA-2025-000",    // sequence starts at 1
            "-2025-001",      // empty prefix
            "TOOLONGPFX-2025-001",
            "MA-year-001",
        ] {
            assert!(
                OrderNumber::parse(bad).is_err(),
                "expected parse failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_is_current_year() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(OrderNumber::new("MA", 2025, 7).is_current_year(now));
        assert!(!OrderNumber::new("MA", 2024, 7).is_current_year(now));
    }

    #[test]
    fn test_sequences_sort_in_issue_order() {
        // Within a year, lexicographic order of the padded form matches
        // numeric order up to 999; past that the parsed sequence is the
        // comparison key
        let a = OrderNumber::parse("MA-2025-001").unwrap();
        let b = OrderNumber::parse("MA-2025-150").unwrap();
        assert!(a.sequence < b.sequence);
    }
}
