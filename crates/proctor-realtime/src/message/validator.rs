//! Message validation rules.

use proctor_core::error::AppError;

/// Maximum length of a client-asserted student id or display name.
const MAX_IDENTITY_LEN: usize = 256;

/// Validates raw inbound text before decoding.
pub fn validate_inbound(raw: &str, max_size: usize) -> Result<(), AppError> {
    if raw.len() > max_size {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates a client-asserted student identity.
pub fn validate_student_id(student_id: &str) -> Result<(), AppError> {
    if student_id.trim().is_empty() {
        return Err(AppError::validation("Student id must not be empty"));
    }

    if student_id.len() > MAX_IDENTITY_LEN {
        return Err(AppError::validation(format!(
            "Student id exceeds {MAX_IDENTITY_LEN} bytes"
        )));
    }

    Ok(())
}
