//! Auth domain - phone OTP sign-in
//!
//! Responsibilities:
//! - OTP challenge issue/verify (one live challenge per phone number)
//! - The Phone -> Otp -> (Name) -> Done sign-in flow
//! - Session/JWT token management

pub mod actions;
pub mod jwt;
pub mod models;
pub mod session;

pub use jwt::{Claims, JwtService};
pub use session::{
    complete_name_step, complete_otp_step, start_sign_in, SignInOutcome, SignInSession,
    SignInStep,
};
