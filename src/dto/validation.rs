//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a player name is non-empty once surrounding whitespace is
/// trimmed. The trimmed form is what gets stored.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Ana").is_ok());
        assert!(validate_player_name("  Ana  ").is_ok());
        assert!(validate_player_name("名前").is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name("\t\n").is_err());
    }
}
