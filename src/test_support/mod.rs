//! Internal helpers re-exported for integration tests.
//!
//! [`PackTree`] scaffolds a throwaway packs root with application, release,
//! and pack directories. [`capture_logs`] records tracing output so tests can
//! assert on cache hits, misses, and omissions.

mod fixtures;
mod logging;

pub use fixtures::PackTree;
pub use logging::capture_logs;
