//! Telemetry metric name constants.
//!
//! Centralised metric names for sprout operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `sprout_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `tier`: remote tier name (e.g. "proxy", "openrouter")
//! - `operation`: tier operation ("generate", "edit", "image", "shopping_list")
//! - `status`: outcome: "ok" or "error"
//! - `source`: where a generated recipe came from: "cache", "primary",
//!   "fallback" or "none"

/// Completed `generate` calls.
///
/// Labels: `source`, `status` ("ok" | "error").
pub const GENERATIONS_TOTAL: &str = "sprout_generations_total";

/// Calls dispatched to a remote tier.
///
/// Labels: `tier`, `operation`, `status` ("ok" | "error").
pub const TIER_REQUESTS_TOTAL: &str = "sprout_tier_requests_total";

/// Remote tier call duration in seconds.
///
/// Labels: `tier`, `operation`.
pub const TIER_REQUEST_DURATION_SECONDS: &str = "sprout_tier_request_duration_seconds";

/// Times the primary tier failed and the fallback tier was tried.
///
/// Labels: `operation`.
pub const FALLBACKS_TOTAL: &str = "sprout_fallbacks_total";

/// Calls whose result was discarded because a newer call started.
pub const SUPERSEDED_TOTAL: &str = "sprout_superseded_total";

/// Recipe cache hits.
pub const CACHE_HITS_TOTAL: &str = "sprout_cache_hits_total";

/// Recipe cache misses, including expired and corrupt entries.
pub const CACHE_MISSES_TOTAL: &str = "sprout_cache_misses_total";

/// Entries deleted on read.
///
/// Labels: `reason` ("expired" | "corrupt").
pub const CACHE_EVICTIONS_TOTAL: &str = "sprout_cache_evictions_total";
