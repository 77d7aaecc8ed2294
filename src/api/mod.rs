//! HTTP handlers for the ticketing API.
//!
//! One module per resource, plus shared pagination and validation helpers.
//! Handlers validate their input, call into stores or the issuance core,
//! and map domain outcomes onto [`AppError`] responses.

pub mod apikeys;
pub mod artists;
pub mod auth;
pub mod events;
pub mod pagination;
pub mod tickets;
pub mod users;

use crate::error::AppError;
use uuid::Uuid;

/// Validate a human name field: non-blank, 2 to 100 characters.
pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.len() < 2 || trimmed.len() > 100 {
        return Err(AppError::validation(format!(
            "{field} must be between 2 and 100 characters"
        )));
    }
    Ok(())
}

/// Validate an email address: a local part and a domain around one `@`.
pub(crate) fn validate_email(value: &str) -> Result<(), AppError> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::validation("email must be valid"));
    }
    Ok(())
}

/// Reject updates whose body carries an id different from the path.
pub(crate) fn ensure_matching_id(path_id: Uuid, body_id: Option<Uuid>) -> Result<(), AppError> {
    match body_id {
        Some(id) if id != path_id => Err(AppError::bad_request(
            "identifier in body does not match the path",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_bounds() {
        assert!(validate_name("name", "Jo").is_ok());
        assert!(validate_name("name", "J").is_err());
        assert!(validate_name("name", " ").is_err());
        assert!(validate_name("name", &"x".repeat(101)).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn id_mismatch_rejected() {
        let id = Uuid::new_v4();
        assert!(ensure_matching_id(id, None).is_ok());
        assert!(ensure_matching_id(id, Some(id)).is_ok());
        assert!(ensure_matching_id(id, Some(Uuid::new_v4())).is_err());
    }
}
