// Minimal client for Twilio Programmable Messaging.
// https://www.twilio.com/docs/messaging/api/message-resource

use std::collections::HashMap;

pub mod models;
use reqwest::{header, Client};

use crate::models::{MessageResponse, TwilioErrorResponse};

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender phone number in E.164 format
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        )
    }

    /// Send an SMS with the given body to `recipient`.
    ///
    /// Returns once Twilio has accepted the message for delivery. Acceptance
    /// does not guarantee the handset receives it.
    pub async fn send_message(
        &self,
        recipient: &str,
        body: &str,
    ) -> Result<MessageResponse, &'static str> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("From", &self.options.from_number);
        form_body.insert("Body", body);

        let res = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .headers(headers)
            .form(&form_body)
            .send()
            .await;

        match res {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    let error = response.json::<TwilioErrorResponse>().await.ok();
                    eprintln!(
                        "Twilio error ({}): {}",
                        status,
                        error.map(|e| e.message).unwrap_or_default()
                    );
                    return Err("Twilio returned an error");
                }

                match response.json::<MessageResponse>().await {
                    Ok(data) => Ok(data),
                    Err(e) => {
                        eprintln!("Failed to parse Twilio response: {}", e);
                        Err("Error parsing message response")
                    }
                }
            }
            Err(e) => {
                eprintln!("Request to Twilio failed: {}", e);
                Err("Error sending message")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url_uses_account_sid() {
        let service = TwilioService::new(TwilioOptions {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550001111".to_string(),
        });

        assert_eq!(
            service.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
