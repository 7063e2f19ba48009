//! Normalization of raw `checks` records into [`Check`] values.
//!
//! Records are written by the external API, so nothing about their shape is
//! trusted. Every required field must pass exactly or the whole record is
//! rejected; the worker-owned fields (`state`, `lastChecked`) fall back to
//! their defaults instead.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use thiserror::Error;

use super::types::{Check, CheckState, Method, Protocol};

pub const CHECK_ID_LENGTH: usize = 20;
pub const OWNER_PHONE_LENGTH: usize = 10;
pub const MIN_TIMEOUT_SECONDS: u64 = 1;
pub const MAX_TIMEOUT_SECONDS: u64 = 5;

/// Why a record could not be turned into a check
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("check {id:?}: field `{field}` is missing or invalid")]
    InvalidField { id: Option<String>, field: &'static str },
    #[error("record stored as {key:?} claims id {id:?}")]
    IdMismatch { key: String, id: String },
}

impl ValidationError {
    fn field(id: &Option<String>, field: &'static str) -> Self {
        ValidationError::InvalidField { id: id.clone(), field }
    }
}

/// Parse a raw record into a check.
pub fn parse_check(raw: &Value) -> Result<Check, ValidationError> {
    let record = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let id = trimmed_with_len(record, "id", CHECK_ID_LENGTH);
    let owner_phone = trimmed_with_len(record, "userPhone", OWNER_PHONE_LENGTH)
        .or_else(|| trimmed_with_len(record, "ownerId", OWNER_PHONE_LENGTH));

    let id = id.ok_or_else(|| ValidationError::field(&None, "id"))?;
    let known = Some(id.clone());

    let owner_phone = owner_phone.ok_or_else(|| ValidationError::field(&known, "userPhone"))?;

    let protocol = record
        .get("protocol")
        .and_then(Value::as_str)
        .and_then(Protocol::parse)
        .ok_or_else(|| ValidationError::field(&known, "protocol"))?;

    let url = record
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ValidationError::field(&known, "url"))?
        .to_string();

    let method = record
        .get("method")
        .and_then(Value::as_str)
        .and_then(Method::parse)
        .ok_or_else(|| ValidationError::field(&known, "method"))?;

    let success_codes =
        success_codes(record).ok_or_else(|| ValidationError::field(&known, "successCodes"))?;

    let timeout_seconds = record
        .get("timeoutSeconds")
        .and_then(Value::as_u64)
        .filter(|secs| (MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(secs))
        .ok_or_else(|| ValidationError::field(&known, "timeoutSeconds"))?;

    let state = record
        .get("state")
        .and_then(Value::as_str)
        .and_then(CheckState::parse)
        .unwrap_or_default();

    let last_checked = record.get("lastChecked").and_then(Value::as_i64).filter(|ts| *ts > 0);

    Ok(Check {
        id,
        owner_phone,
        protocol,
        url,
        method,
        success_codes,
        timeout_seconds,
        state,
        last_checked,
    })
}

fn trimmed_with_len(record: &Map<String, Value>, key: &str, len: usize) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| value.chars().count() == len)
        .map(str::to_string)
}

/// Non-empty list of integer status codes; any non-integer entry rejects the list
fn success_codes(record: &Map<String, Value>) -> Option<BTreeSet<i64>> {
    let codes = record.get("successCodes")?.as_array()?;
    if codes.is_empty() {
        return None;
    }

    codes.iter().map(Value::as_i64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "id": "12345678901234567890",
            "userPhone": "5551234567",
            "protocol": "http",
            "url": "example.com",
            "method": "get",
            "successCodes": [200, 201],
            "timeoutSeconds": 2,
            "state": "up",
            "lastChecked": 1_700_000_000_000_i64
        })
    }

    fn without(field: &str) -> Value {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove(field);
        record
    }

    fn with(field: &str, value: Value) -> Value {
        let mut record = valid_record();
        record[field] = value;
        record
    }

    #[test]
    fn test_valid_record() {
        let check = parse_check(&valid_record()).unwrap();

        assert_eq!(check.id, "12345678901234567890");
        assert_eq!(check.owner_phone, "5551234567");
        assert_eq!(check.protocol, Protocol::Http);
        assert_eq!(check.method, Method::Get);
        assert_eq!(check.success_codes, BTreeSet::from([200, 201]));
        assert_eq!(check.timeout_seconds, 2);
        assert_eq!(check.state, CheckState::Up);
        assert_eq!(check.last_checked, Some(1_700_000_000_000));
    }

    #[test]
    fn test_missing_required_fields_are_rejected() {
        for field in ["id", "userPhone", "protocol", "url", "method", "successCodes", "timeoutSeconds"]
        {
            let err = parse_check(&without(field)).unwrap_err();
            match err {
                ValidationError::InvalidField { field: failed, .. } => assert_eq!(failed, field),
                other => panic!("unexpected error for {field}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_owner_id_alias_is_accepted() {
        let mut record = without("userPhone");
        record["ownerId"] = json!("5551234567");

        assert_eq!(parse_check(&record).unwrap().owner_phone, "5551234567");
    }

    #[test]
    fn test_field_rules() {
        // Invalid - lengths
        assert!(parse_check(&with("id", json!("short"))).is_err());
        assert!(parse_check(&with("userPhone", json!("555123456"))).is_err());

        // Invalid - enums
        assert!(parse_check(&with("protocol", json!("ftp"))).is_err());
        assert!(parse_check(&with("method", json!("GET"))).is_err());
        assert!(parse_check(&with("method", json!("patch"))).is_err());

        // Invalid - url
        assert!(parse_check(&with("url", json!("   "))).is_err());

        // Invalid - success codes
        assert!(parse_check(&with("successCodes", json!([]))).is_err());
        assert!(parse_check(&with("successCodes", json!(["200"]))).is_err());
        assert!(parse_check(&with("successCodes", json!(200))).is_err());
        assert!(parse_check(&with("successCodes", json!([200.5]))).is_err());

        // Valid - any integer code, even one no server can return
        let check = parse_check(&with("successCodes", json!([200, 600, 200]))).unwrap();
        assert_eq!(check.success_codes, BTreeSet::from([200, 600]));

        // Invalid - timeout
        assert!(parse_check(&with("timeoutSeconds", json!(0))).is_err());
        assert!(parse_check(&with("timeoutSeconds", json!(6))).is_err());
        assert!(parse_check(&with("timeoutSeconds", json!(2.5))).is_err());

        // Valid - boundaries
        assert!(parse_check(&with("timeoutSeconds", json!(1))).is_ok());
        assert!(parse_check(&with("timeoutSeconds", json!(5))).is_ok());
    }

    #[test]
    fn test_strings_are_trimmed() {
        let record = with("url", json!("  example.com/path  "));
        assert_eq!(parse_check(&record).unwrap().url, "example.com/path");

        let record = with("id", json!(" 12345678901234567890 "));
        assert_eq!(parse_check(&record).unwrap().id, "12345678901234567890");
    }

    #[test]
    fn test_worker_fields_default() {
        let check = parse_check(&without("state")).unwrap();
        assert_eq!(check.state, CheckState::Down);

        let check = parse_check(&with("state", json!("sideways"))).unwrap();
        assert_eq!(check.state, CheckState::Down);

        let check = parse_check(&without("lastChecked")).unwrap();
        assert_eq!(check.last_checked, None);

        let check = parse_check(&with("lastChecked", json!(false))).unwrap();
        assert_eq!(check.last_checked, None);

        let check = parse_check(&with("lastChecked", json!(-5))).unwrap();
        assert_eq!(check.last_checked, None);
    }

    #[test]
    fn test_rejection_carries_check_id() {
        let err = parse_check(&with("url", json!(""))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidField {
                id: Some("12345678901234567890".to_string()),
                field: "url"
            }
        );

        let err = parse_check(&without("id")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidField { id: None, field: "id" });

        assert_eq!(parse_check(&json!([1, 2])).unwrap_err(), ValidationError::NotAnObject);
    }
}
