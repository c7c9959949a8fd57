//! Guard-rail bounds applied at every public entry point.

use crate::model::Ms;

pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// Widest span a single booking may cover.
pub const MAX_SPAN_DURATION_MS: Ms = 366 * 24 * 3_600_000;

/// Widest window a slot query may cover.
pub const MAX_QUERY_WINDOW_MS: Ms = 92 * 24 * 3_600_000;

pub const MAX_RESOURCES: usize = 10_000;
pub const MAX_LINKS_PER_RESOURCE: usize = 64;
pub const MAX_TEMPLATES: usize = 512;
pub const MAX_RESERVE_TARGETS: usize = 32;

/// Upper bound on slots emitted by one query; exceeding it is an error,
/// never a silent truncation.
pub const MAX_SLOTS_PER_QUERY: usize = 10_000;

pub const MINUTES_PER_DAY: u32 = 24 * 60;
