//! Shared tracing targets for observability instrumentation.
//!
//! Centralises the log targets used by the crate so subscribers can filter
//! cache-engine events separately from request handling.

/// Target used by version resolution and the archive cache engine.
pub(crate) const CACHE_TARGET: &str = "asset_pack::cache";

/// Target used by request orchestration.
pub(crate) const REQUEST_TARGET: &str = "asset_pack::request";
