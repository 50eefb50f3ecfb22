//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects empty or whitespace-only strings.
///
/// # Examples
///
/// ```ignore
/// validate_non_blank("Geography") // Ok
/// validate_non_blank("   ")       // Err
/// ```
pub fn validate_non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_blank() {
        assert!(validate_non_blank("Alice").is_ok());
        assert!(validate_non_blank(" x ").is_ok());
        assert!(validate_non_blank("").is_err());
        assert!(validate_non_blank(" \t").is_err());
    }
}
