//! Integration tests for parley-client.
//!
//! - `handshake_tests` - offer/answer role selection and validation
//! - `candidate_tests` - remote candidate queueing and application
//! - `lifecycle_tests` - start, end, timeout and failure of a call
//! - `relay_tests` - two coordinators talking through a live relay

pub mod handshake_tests;
pub mod relay_tests;

use tracing::Level;

/// Initialize tracing for tests (call once per test).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
