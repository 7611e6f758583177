//! Shared helpers for binding url-encoded form input.

use std::collections::BTreeMap;

use time::{macros::format_description, Time};
use uuid::Uuid;
use validator::ValidationErrors;

/// Field name to error messages, as shown next to each form field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub fn collect(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

pub const ALREADY_USED: &str = "This value is already used.";

/// Errors for a write the store refused because `field` must be unique.
pub fn already_used(field: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    add_error(&mut errors, field, ALREADY_USED);
    errors
}

pub fn add_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Trims the value; blank input becomes `None`.
pub fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_non_negative(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
) -> Option<i32> {
    let raw = optional(value)?;
    match raw.parse::<i32>() {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => {
            add_error(errors, field, "This value should be positive or zero.");
            None
        }
        Err(_) => {
            add_error(errors, field, "This value is not a valid number.");
            None
        }
    }
}

pub fn parse_time(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<Time> {
    let raw = optional(value)?;
    match Time::parse(&raw, format_description!("[hour]:[minute]")) {
        Ok(t) => Some(t),
        Err(_) => {
            add_error(errors, field, "This value is not a valid time.");
            None
        }
    }
}

pub fn format_time(time: Time) -> String {
    time.format(format_description!("[hour]:[minute]"))
        .unwrap_or_default()
}

pub fn parse_id(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Uuid> {
    let raw = value.trim();
    if raw.is_empty() {
        add_error(errors, field, "This value should not be blank.");
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            add_error(errors, field, "This value is not valid.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_is_none() {
        assert_eq!(optional(&Some("   ".into())), None);
        assert_eq!(optional(&None), None);
        assert_eq!(optional(&Some(" easy ".into())), Some("easy".into()));
    }

    #[test]
    fn numbers_must_be_non_negative() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_non_negative(&mut errors, "calories", &Some("350".into())), Some(350));
        assert_eq!(parse_non_negative(&mut errors, "calories", &Some("-1".into())), None);
        assert_eq!(parse_non_negative(&mut errors, "portion", &Some("two".into())), None);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn time_is_hours_and_minutes() {
        let mut errors = FieldErrors::new();
        let t = parse_time(&mut errors, "time", &Some("01:30".into())).unwrap();
        assert_eq!(format_time(t), "01:30");
        assert!(parse_time(&mut errors, "time", &Some("90 minutes".into())).is_none());
        assert_eq!(errors["time"].len(), 1);
    }

    #[test]
    fn id_must_be_present_and_valid() {
        let mut errors = FieldErrors::new();
        assert!(parse_id(&mut errors, "category", "").is_none());
        assert!(parse_id(&mut errors, "category", "italian").is_none());
        assert_eq!(errors["category"].len(), 2);
    }
}
