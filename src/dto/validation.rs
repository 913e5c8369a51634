//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

use crate::dto::game::AnswerOptionInput;

/// Longest accepted answer option identifier.
pub const MAX_OPTION_ID_LENGTH: usize = 64;

/// Validates that an option id is non-blank, reasonably short and free of whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_option_id("a1")     // Ok
/// validate_option_id("")       // Err - empty
/// validate_option_id("a 1")    // Err - whitespace
/// ```
pub fn validate_option_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.chars().count() > MAX_OPTION_ID_LENGTH {
        let mut err = ValidationError::new("option_id_length");
        err.message = Some(
            format!(
                "Option ID must be between 1 and {MAX_OPTION_ID_LENGTH} characters (got {})",
                id.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("option_id_format");
        err.message = Some("Option ID must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that no two options of a question share an id.
pub fn validate_unique_option_ids(options: &[AnswerOptionInput]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if let Some(duplicate) = options.iter().find(|option| !seen.insert(option.id.as_str())) {
        let mut err = ValidationError::new("option_id_duplicate");
        err.message = Some(format!("Option ID `{}` is declared more than once", duplicate.id).into());
        return Err(err);
    }
    Ok(())
}
