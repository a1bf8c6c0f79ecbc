//! Input validation helpers
//!
//! Centralized text length constants and validation functions. redb TEXT
//! values have no built-in length enforcement, so every handler-visible
//! string goes through these.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: products, buyer display names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, reasons (hold note, rejection reason, audit note)
pub const MAX_NOTE_LEN: usize = 500;

/// Bank references, promo codes, category tags
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// A single voucher code line
pub const MAX_CODE_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal email shape check: non-empty local part, one '@', a dot in the domain.
///
/// Deliverability is the mail collaborator's problem; this only rejects
/// obvious garbage before an order is created around it.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "buyer_email", MAX_EMAIL_LEN)?;
    let Some((local, domain)) = value.split_once('@') else {
        return Err(AppError::Validation("buyer_email is not a valid address".into()));
    };
    if local.is_empty() || domain.len() < 3 || !domain.contains('.') || domain.contains('@') {
        return Err(AppError::Validation("buyer_email is not a valid address".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("student@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@@example.com").is_err());
    }

    #[test]
    fn enforces_length_limits() {
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        assert!(validate_required_text(&long, "note", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&Some(long), "note", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
    }
}
