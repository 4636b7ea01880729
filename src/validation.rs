use validator::ValidationError;

/// Validates that a category name is not blank once trimmed.
pub fn validate_category_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("blank_name");
        error.message = Some("Category name must not be blank".into());
        return Err(error);
    }
    Ok(())
}
