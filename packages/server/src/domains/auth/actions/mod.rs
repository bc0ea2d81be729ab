//! Auth domain actions - OTP challenge lifecycle
//!
//! Actions are async functions called from the sign-in session and the
//! HTTP routes.

mod issue_challenge;
mod verify_challenge;

pub use issue_challenge::{generate_otp_code, is_test_identifier, issue_challenge, TEST_IDENTIFIER, TEST_OTP_CODE};
pub use verify_challenge::verify_challenge;
