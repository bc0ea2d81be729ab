use thiserror::Error;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    /// The record's primary key is already taken (e.g. a customer for this
    /// phone number, or a redemption code for this owner and batch).
    #[error("already exists")]
    AlreadyExists,
    /// A secondary unique value collided (referral id, redemption code).
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                match db.constraint() {
                    Some(name) if name.ends_with("_pkey") || name.ends_with("_batch_key") => {
                        StoreError::AlreadyExists
                    }
                    _ => StoreError::Conflict,
                }
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Errors surfaced by domain operations.
///
/// `Conflict` only escapes when internal retries are exhausted; callers map
/// it to "try again later" the same way as `Unavailable`.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("expired")]
    Expired,

    #[error("code does not match")]
    Mismatch,

    #[error("uniqueness conflict persisted after retries")]
    Conflict,

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("not allowed in the current step: {0}")]
    InvalidTransition(&'static str),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict | StoreError::AlreadyExists => PortalError::Conflict,
            StoreError::NotFound => PortalError::NotFound("record"),
            StoreError::Backend(msg) => PortalError::Unavailable(msg),
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

/// A stored enum column held a value this build does not know.
#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
