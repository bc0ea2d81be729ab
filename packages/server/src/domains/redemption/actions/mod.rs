//! Redemption code engine actions

mod issue;
mod lifecycle;

pub use issue::maybe_issue_for_count;
pub use lifecycle::{list_for_owner, mark_used, verify_code, verify_owned_code};
