//! Request field checks shared by the orchestrators

use crate::error::{PlatformError, Result};

/// Trimmed, non-empty value of a required field
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlatformError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Required field that also becomes part of an object key
pub(crate) fn path_safe(field: &str, value: &str) -> Result<String> {
    let value = required(field, value)?;
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(PlatformError::validation(format!(
            "{field} must not contain path separators"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("imageName", "  nginx ").unwrap(), "nginx");
        assert!(required("imageName", "   ").is_err());
    }

    #[test]
    fn test_path_safe_rejects_separators() {
        assert!(path_safe("creatorName", "bob").is_ok());
        assert!(path_safe("creatorName", "../bob").is_err());
        assert!(path_safe("creatorName", "a/b").is_err());
    }
}
