//! Ranking Models

use serde::{Deserialize, Serialize};

/// One row of a leaderboard, ordered by total desc then member id asc
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankingEntry {
    pub member_id: i64,
    pub display_name: String,
    pub total_points: i64,
}
