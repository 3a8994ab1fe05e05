//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_PLAYER_ID_LENGTH: usize = 40;
const MAX_PERIOD_LENGTH: usize = 12;

/// Validates that a player id is non-empty, at most 40 characters, and free
/// of whitespace. Player ids are otherwise opaque strings owned by the
/// roster service.
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        let mut err = ValidationError::new("player_id_empty");
        err.message = Some("Player id must not be empty".into());
        return Err(err);
    }

    if id.len() > MAX_PLAYER_ID_LENGTH {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!(
                "Player id must be at most {MAX_PLAYER_ID_LENGTH} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player id must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a period label: non-blank and at most 12 characters. Inner
/// whitespace is legal (`"OT 2"` is a recognized overtime spelling).
pub fn validate_period_label(label: &str) -> Result<(), ValidationError> {
    if label.trim().is_empty() {
        let mut err = ValidationError::new("period_empty");
        err.message = Some("Period label must not be blank".into());
        return Err(err);
    }

    if label.len() > MAX_PERIOD_LENGTH {
        let mut err = ValidationError::new("period_length");
        err.message = Some(
            format!(
                "Period label must be at most {MAX_PERIOD_LENGTH} characters (got {})",
                label.len()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_id_valid() {
        assert!(validate_player_id("p1").is_ok());
        assert!(validate_player_id("jersey-23").is_ok());
        assert!(validate_player_id("5f3a9c").is_ok());
    }

    #[test]
    fn test_validate_player_id_invalid() {
        assert!(validate_player_id("").is_err());
        assert!(validate_player_id("player one").is_err()); // whitespace
        assert!(validate_player_id(&"x".repeat(41)).is_err()); // too long
    }

    #[test]
    fn test_validate_period_label() {
        assert!(validate_period_label("Q1").is_ok());
        assert!(validate_period_label("OT 2").is_ok());
        assert!(validate_period_label("").is_err());
        assert!(validate_period_label("   ").is_err());
        assert!(validate_period_label("QUARTER-TWELVE").is_err()); // too long
    }
}
