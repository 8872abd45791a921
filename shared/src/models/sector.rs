//! Sector Models

use serde::{Deserialize, Serialize};

use super::member::{MemberRole, MemberStatus};

/// Sector entity (organizational unit)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sector {
    pub id: i64,
    pub name: String,
    /// Token new members present at registration / join
    pub invite_token: String,
    pub leader_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create sector payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorCreate {
    pub name: String,
}

/// Assign sector leader payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignLeaderRequest {
    pub member_id: i64,
}

/// Join sector payload (existing members)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSectorRequest {
    pub invite_token: String,
}

/// Sector with leader info (for admin list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SectorWithLeader {
    pub id: i64,
    pub name: String,
    pub invite_token: String,
    pub leader_id: Option<i64>,
    pub leader_name: Option<String>,
    pub member_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Member row in a sector roster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SectorMemberEntry {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: i64,
}
