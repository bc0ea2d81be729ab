//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod memory_store;
pub mod pg_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, SystemClock, TwilioAdapter};
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use test_dependencies::{
    CollidingStore, FixedClock, MockSmsSender, TestDependencies, RACE_WINNER_REFERRAL_ID,
};
pub use traits::*;
