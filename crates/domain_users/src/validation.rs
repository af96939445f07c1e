//! Field validation for user registration

use validator::ValidateEmail;

use crate::error::UserError;

/// Validates an email address
pub fn validate_email(email: &str) -> Result<(), UserError> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(UserError::InvalidEmail(email.to_string()))
    }
}

/// Validates a vehicle registration number
///
/// Plates are stored normalized: uppercase, no spaces or hyphens. A valid
/// plate is 6 to 12 alphanumeric characters and must contain at least one
/// letter and one digit (e.g. `MH12AB1234`, `KA05MJ0042`).
pub fn validate_vehicle_number(raw: &str) -> Result<String, UserError> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let len_ok = (6..=12).contains(&normalized.len());
    let charset_ok = normalized.chars().all(|c| c.is_ascii_alphanumeric());
    let has_letter = normalized.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = normalized.chars().any(|c| c.is_ascii_digit());

    if len_ok && charset_ok && has_letter && has_digit {
        Ok(normalized)
    } else {
        Err(UserError::InvalidVehicleNumber(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("driver@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_vehicle_number_normalization() {
        assert_eq!(validate_vehicle_number("mh 12 ab 1234").unwrap(), "MH12AB1234");
        assert_eq!(validate_vehicle_number("KA-05-MJ-0042").unwrap(), "KA05MJ0042");
    }

    #[test]
    fn test_vehicle_number_rejects_garbage() {
        assert!(validate_vehicle_number("").is_err());
        assert!(validate_vehicle_number("12345").is_err());
        assert!(validate_vehicle_number("ABCDEF").is_err());
        assert!(validate_vehicle_number("MH12@B1234").is_err());
        assert!(validate_vehicle_number("MH12AB1234MH12AB").is_err());
    }
}
