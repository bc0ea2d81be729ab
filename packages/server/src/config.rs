use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::common::normalize_phone_number;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When absent the server runs on the
    /// in-memory store (development only, nothing survives a restart).
    pub database_url: Option<String>,
    pub port: u16,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub allowed_origins: Vec<String>,
    pub admin_identifiers: Vec<String>,
    pub test_identifier_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_from_number: env::var("TWILIO_FROM_NUMBER")
                .context("TWILIO_FROM_NUMBER must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "referral-portal".to_string()),
            allowed_origins: parse_list(env::var("ALLOWED_ORIGINS").ok()),
            admin_identifiers: parse_admin_identifiers(env::var("ADMIN_IDENTIFIERS").ok())?,
            test_identifier_enabled: parse_bool(env::var("TEST_IDENTIFIER_ENABLED").ok())
                .context("TEST_IDENTIFIER_ENABLED must be true or false")?,
        })
    }
}

/// Split a comma-separated variable, dropping blanks
fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Admin phone numbers, normalized the same way sign-in normalizes them
fn parse_admin_identifiers(raw: Option<String>) -> Result<Vec<String>> {
    parse_list(raw)
        .iter()
        .map(|entry| {
            normalize_phone_number(entry)
                .with_context(|| format!("ADMIN_IDENTIFIERS entry is not a phone number: {}", entry))
        })
        .collect()
}

fn parse_bool(raw: Option<String>) -> Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => anyhow::bail!("unrecognised boolean: {}", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_skips_blanks() {
        let list = parse_list(Some(" +15550000000, ,+15551111111 ".to_string()));
        assert_eq!(list, vec!["+15550000000", "+15551111111"]);
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn test_admin_identifiers_are_normalized() {
        let admins =
            parse_admin_identifiers(Some("+1 555 999 0000, +1 (555) 123-4567".to_string())).unwrap();
        assert_eq!(admins, vec!["+15559990000", "+15551234567"]);
        assert!(parse_admin_identifiers(Some("admin@example.com".to_string())).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(!parse_bool(None).unwrap());
        assert!(parse_bool(Some("TRUE".to_string())).unwrap());
        assert!(parse_bool(Some("1".to_string())).unwrap());
        assert!(!parse_bool(Some("false".to_string())).unwrap());
        assert!(parse_bool(Some("yes please".to_string())).is_err());
    }
}
