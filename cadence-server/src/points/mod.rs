//! Points Engine
//!
//! Pure reads over the membership store and event ledger. The
//! aggregator derives a member's total from three disjoint sources;
//! the ranking engine sorts those totals deterministically. Nothing
//! in this module writes.

pub mod aggregator;
pub mod ranking;

pub use aggregator::{calculate_points, sector_breakdown};
pub use ranking::{rank_global, rank_sector};

/// Aggregation boundary for a point total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Organization-wide: only globally-flagged events and codes count
    Global,
    /// One sector: only events and codes scoped to it count
    Sector(i64),
}

/// Half-open `[start, end)` window in Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}
