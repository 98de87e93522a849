use regex::Regex;
use validator::ValidationError;

lazy_static::lazy_static! {
    // Letters and digits, plus inner spaces, dots, apostrophes, underscores and hyphens.
    pub static ref NAME_REGEX: Regex = Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} .'_-]*$").unwrap();
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
