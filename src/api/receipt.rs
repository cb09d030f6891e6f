//! Receipt identifiers for departmental dues.
//!
//! A receipt number reads `BME/<year>/<seq>` where the sequence is a
//! zero-padded four-digit counter scoped to the calendar year. The
//! companion watermark and payment-reference codes are opaque tokens for
//! manual verification; they are not a security boundary.

use regex::Regex;
use uuid::Uuid;

pub const RECEIPT_PREFIX: &str = "BME";
pub const WATERMARK_PREFIX: &str = "BME-";
pub const PAYMENT_PREFIX: &str = "PAY-";

/// Formats a receipt number, e.g. `BME/2024/0007`.
pub fn receipt_number(year: i32, sequence: i64) -> String {
    format!("{RECEIPT_PREFIX}/{year}/{sequence:04}")
}

/// Watermark code: fixed prefix plus 12 uppercase hex characters.
pub fn watermark_code() -> String {
    format!("{WATERMARK_PREFIX}{}", token(12))
}

/// Payment reference: fixed prefix plus 10 uppercase hex characters.
/// Uniqueness is backed by the storage layer's unique index.
pub fn payment_reference() -> String {
    format!("{PAYMENT_PREFIX}{}", token(10))
}

fn token(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_uppercase()
}

/// A code presented for verification: either a full receipt number or a
/// watermark code printed on the receipt.
#[derive(Debug, PartialEq, Eq)]
pub enum VerificationCode {
    ReceiptNumber(String),
    Watermark(String),
}

/// Classifies a user-supplied verification code. Returns `None` when the
/// code matches neither format.
pub fn parse_verification_code(code: &str) -> Option<VerificationCode> {
    let code = code.trim();
    let receipt = Regex::new(r"^BME/\d{4}/\d{4}$").unwrap();
    let watermark = Regex::new(r"^BME-[0-9A-F]{12}$").unwrap();
    if receipt.is_match(code) {
        Some(VerificationCode::ReceiptNumber(code.to_string()))
    } else if watermark.is_match(code) {
        Some(VerificationCode::Watermark(code.to_string()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_number_is_zero_padded() {
        assert_eq!(receipt_number(2024, 1), "BME/2024/0001");
        assert_eq!(receipt_number(2024, 123), "BME/2024/0123");
        assert_eq!(receipt_number(2025, 10000), "BME/2025/10000");
    }

    #[test]
    fn tokens_carry_prefix_and_length() {
        let watermark = watermark_code();
        assert!(watermark.starts_with("BME-"));
        assert_eq!(watermark.len(), "BME-".len() + 12);
        assert!(watermark["BME-".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

        let reference = payment_reference();
        assert!(reference.starts_with("PAY-"));
        assert_eq!(reference.len(), "PAY-".len() + 10);
    }

    #[test]
    fn tokens_are_not_repeated() {
        assert_ne!(watermark_code(), watermark_code());
        assert_ne!(payment_reference(), payment_reference());
    }

    #[test]
    fn verification_codes_parse() {
        assert_eq!(
            parse_verification_code("BME/2024/0001"),
            Some(VerificationCode::ReceiptNumber("BME/2024/0001".into()))
        );
        assert_eq!(
            parse_verification_code(" BME-AB12CD34EF56 "),
            Some(VerificationCode::Watermark("BME-AB12CD34EF56".into()))
        );
        assert_eq!(parse_verification_code("BME/24/1"), None);
        assert_eq!(parse_verification_code("BME-ab12cd34ef56"), None);
        assert_eq!(parse_verification_code("receipt"), None);
    }
}
