use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{AlertSender, MAX_MESSAGE_LEN, SenderError};
use crate::config::Alerts;

/// A sender for text messages via the Twilio-compatible messaging API.
pub struct SmsSender {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_phone: String,
}

impl SmsSender {
    pub fn new(config: &Alerts) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_phone: config.from_phone.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base, self.account_sid)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SmsMessage<'a> {
    from: &'a str,
    to: &'a str,
    body: &'a str,
}

#[async_trait]
impl AlertSender for SmsSender {
    async fn send(&self, owner_phone: &str, message: &str) -> Result<(), SenderError> {
        let phone = owner_phone.trim();
        if phone.len() != 10 {
            return Err(SenderError::InvalidRecipient(phone.to_string()));
        }

        let body = message.trim();
        if body.is_empty() || body.chars().count() > MAX_MESSAGE_LEN {
            return Err(SenderError::InvalidMessage(format!(
                "length {} outside 1..={MAX_MESSAGE_LEN}",
                body.chars().count()
            )));
        }

        let to = format!("+1{phone}");
        let payload = SmsMessage { from: &self.from_phone, to: &to, body };

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&payload)
            .send()
            .await?;
        let status = response.status();

        if status != StatusCode::OK && status != StatusCode::CREATED {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed { status: status.as_u16(), body: error_body });
        }

        Ok(())
    }
}
