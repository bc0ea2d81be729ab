use serde::{Deserialize, Serialize};

/// Subset of the Message resource returned by `POST Messages.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
    pub to: String,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Error body Twilio returns for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioErrorResponse {
    pub code: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub more_info: Option<String>,
    pub status: Option<u16>,
}
