// Common types and utilities shared across the application

pub mod errors;
pub mod phone;

pub use errors::{PortalError, PortalResult, StoreError, UnknownVariant};
pub use phone::normalize_phone_number;
