use async_trait::async_trait;
use thiserror::Error;

use crate::monitoring::types::{Check, CheckState};

pub mod sms;

pub use sms::SmsSender;

/// Longest message body the SMS provider accepts
pub const MAX_MESSAGE_LEN: usize = 1600;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Provider returned non-success status {status}: {body}")]
    SendFailed { status: u16, body: String },
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Alerts are disabled")]
    Disabled,
}

/// Delivers state-change alerts to a check's owner.
#[async_trait]
pub trait AlertSender: Send + Sync {
    /// Send `message` to the owner phone number (10 digits, no country code).
    async fn send(&self, owner_phone: &str, message: &str) -> Result<(), SenderError>;
}

/// Sender used when alerting is switched off in config
pub struct DisabledSender;

#[async_trait]
impl AlertSender for DisabledSender {
    async fn send(&self, _owner_phone: &str, _message: &str) -> Result<(), SenderError> {
        Err(SenderError::Disabled)
    }
}

/// Text sent to the owner when `check` moves to `state`
pub fn compose_message(check: &Check, state: CheckState) -> String {
    let message = format!(
        "Alert: Your check for {} {}://{} is currently {}",
        check.method.to_string().to_uppercase(),
        check.protocol,
        check.url,
        state
    );
    message.chars().take(MAX_MESSAGE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::types::{Method, Protocol};
    use std::collections::BTreeSet;

    fn check(url: &str) -> Check {
        Check {
            id: "12345678901234567890".to_string(),
            owner_phone: "5551234567".to_string(),
            protocol: Protocol::Https,
            url: url.to_string(),
            method: Method::Post,
            success_codes: BTreeSet::from([200]),
            timeout_seconds: 2,
            state: CheckState::Up,
            last_checked: Some(1),
        }
    }

    #[test]
    fn test_compose_message() {
        assert_eq!(
            compose_message(&check("example.com/api"), CheckState::Down),
            "Alert: Your check for POST https://example.com/api is currently down"
        );
    }

    #[test]
    fn test_compose_message_is_truncated() {
        let long_url = "a".repeat(2 * MAX_MESSAGE_LEN);
        assert_eq!(compose_message(&check(&long_url), CheckState::Up).chars().count(), MAX_MESSAGE_LEN);
    }

    #[tokio::test]
    async fn test_disabled_sender_never_delivers() {
        let result = DisabledSender.send("5551234567", "hello").await;
        assert!(matches!(result, Err(SenderError::Disabled)));
    }
}
