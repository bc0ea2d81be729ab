//! In-process test harness.
//!
//! Each test gets its own in-memory store, mock SMS sender and fixed clock,
//! wired into the real router. Requests go through `tower::ServiceExt::oneshot`,
//! so no socket is opened.

use axum::Router;
use referral_core::kernel::TestDependencies;
use referral_core::server::build_app;
use test_context::AsyncTestContext;

/// Phone number configured as an admin in every harness
pub const ADMIN_PHONE: &str = "+15559990000";

/// Test harness that owns the router and the handles behind it.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     let response = ctx.get("/health", None).await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub deps: TestDependencies,
    pub app: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        init_tracing();
        Self::new(TestDependencies::new().with_admin(ADMIN_PHONE))
    }

    async fn teardown(self) {}
}

impl TestHarness {
    pub fn new(deps: TestDependencies) -> Self {
        let app = build_app(deps.server_deps(), &[]);
        Self { deps, app }
    }
}

/// Respect RUST_LOG in tests; run with `RUST_LOG=debug cargo test -- --nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
