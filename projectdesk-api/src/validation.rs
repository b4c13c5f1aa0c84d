/// Field validators shared by request types
///
/// The `validate_*` functions plug into `#[validate(custom(function = ...))]`.
/// [`validate_request`] runs a request's derived rules plus checks that the
/// derive cannot express, such as dates inside `Option<Option<String>>`, and
/// reports every failure at once.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate};
use projectdesk_shared::models::{
    project::{Priority, ProjectStatus},
    project_member::MemberRole,
    task::TaskStatus,
    user::UserRole,
};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiResult;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn validate_priority(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<Priority>()
        .map(|_| ())
        .map_err(|_| invalid("priority", "Priority must be low, medium or high"))
}

pub fn validate_project_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<ProjectStatus>()
        .map(|_| ())
        .map_err(|_| invalid("status", "Status must be active, paused, completed or cancelled"))
}

pub fn validate_task_status(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<TaskStatus>()
        .map(|_| ())
        .map_err(|_| invalid("status", "Status must be pending, in_progress, completed or cancelled"))
}

pub fn validate_member_role(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<MemberRole>()
        .map(|_| ())
        .map_err(|_| invalid("role", "Role must be member or manager"))
}

pub fn validate_user_role(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<UserRole>()
        .map(|_| ())
        .map_err(|_| invalid("role", "Role must be user or admin"))
}

/// Rejects strings that are empty after trimming
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("blank", "Must not be empty"))
    } else {
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
pub fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

/// Runs derived validation plus ISO date checks on the given fields
///
/// `None` dates are skipped. All failures are collected into one
/// validation error.
pub fn validate_request<T: Validate>(
    request: &T,
    dates: &[(&'static str, Option<&str>)],
) -> ApiResult<()> {
    let mut errors = request.validate().err().unwrap_or_else(ValidationErrors::new);

    for (field, value) in dates {
        if let Some(value) = value {
            if !is_iso_date(value) {
                errors.add(*field, invalid("date", "Must be an ISO 8601 date"));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

/// Flattens an optional nullable date for [`validate_request`]
pub fn nullable_str(value: &Option<Option<String>>) -> Option<&str> {
    value.as_ref().and_then(|inner| inner.as_deref())
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_enum_validators() {
        assert!(validate_priority("high").is_ok());
        assert!(validate_priority("urgent").is_err());
        assert!(validate_project_status("paused").is_ok());
        assert!(validate_project_status("pending").is_err());
        assert!(validate_task_status("in_progress").is_ok());
        assert!(validate_task_status("paused").is_err());
        assert!(validate_member_role("manager").is_ok());
        assert!(validate_member_role("owner").is_err());
        assert!(validate_user_role("admin").is_ok());
        assert!(validate_user_role("root").is_err());
    }

    #[test]
    fn test_validator_messages_are_set() {
        let err = validate_priority("urgent").unwrap_err();
        assert_eq!(err.message.unwrap(), "Priority must be low, medium or high");
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_iso_dates() {
        assert!(is_iso_date("2025-06-30"));
        assert!(is_iso_date("2025-06-30T12:00:00Z"));
        assert!(is_iso_date("2025-06-30T12:00:00-03:00"));
        assert!(!is_iso_date("30/06/2025"));
        assert!(!is_iso_date("2025-13-01"));
        assert!(!is_iso_date(""));
    }

    #[derive(Validate)]
    struct Named {
        #[validate(custom(function = "validate_not_blank"))]
        name: String,
    }

    #[test]
    fn test_validate_request_collects_dates_and_fields() {
        let request = Named {
            name: " ".to_string(),
        };

        let err = validate_request(&request, &[("due_date", Some("tomorrow")), ("start_date", None)])
            .unwrap_err();

        match err {
            ApiError::ValidationError(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["due_date", "name"]);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }

        let ok = Named {
            name: "fine".to_string(),
        };
        assert!(validate_request(&ok, &[("due_date", Some("2025-01-01"))]).is_ok());
    }

    #[test]
    fn test_nullable_str() {
        assert_eq!(nullable_str(&None), None);
        assert_eq!(nullable_str(&Some(None)), None);
        assert_eq!(nullable_str(&Some(Some("2025-01-01".to_string()))), Some("2025-01-01"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
