//! Phone number validation for the application flow.

use crate::error::ValidationError;

/// Normalize a Russian phone number: strip everything but digits, require
/// a leading 7 or 8, rewrite a leading 8 to 7, prefix with `+`.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let mut chars = digits.chars();
    match chars.next() {
        None => Err(ValidationError::PhoneNoDigits),
        Some('7') => Ok(format!("+{digits}")),
        Some('8') => Ok(format!("+7{}", chars.as_str())),
        Some(other) => Err(ValidationError::PhoneBadPrefix(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_eight_rewritten_to_seven() {
        assert_eq!(normalize_phone("89511222890").unwrap(), "+79511222890");
    }

    #[test]
    fn formatted_input_is_stripped() {
        assert_eq!(normalize_phone("+7 951 122 28 90").unwrap(), "+79511222890");
        assert_eq!(normalize_phone("8 (951) 122-28-90").unwrap(), "+79511222890");
    }

    #[test]
    fn leading_seven_kept() {
        assert_eq!(normalize_phone("79511222890").unwrap(), "+79511222890");
    }

    #[test]
    fn other_leading_digit_rejected() {
        assert!(matches!(
            normalize_phone("912345"),
            Err(ValidationError::PhoneBadPrefix('9'))
        ));
    }

    #[test]
    fn no_digits_rejected() {
        assert!(matches!(
            normalize_phone("call me"),
            Err(ValidationError::PhoneNoDigits)
        ));
        assert!(matches!(
            normalize_phone(""),
            Err(ValidationError::PhoneNoDigits)
        ));
    }
}
