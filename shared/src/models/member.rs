//! Member Model

use serde::{Deserialize, Serialize};

use super::code::CodeKind;

/// Member role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MemberRole {
    Regular,
    Leader,
    Admin,
}

/// Member account status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MemberStatus {
    Pending,
    Active,
}

/// Member entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)]
    pub hash_pass: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    /// Distributable point balance; meaningful only while role == LEADER
    pub budget: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Member response (without password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemberInfo {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub created_at: i64,
}

impl From<Member> for MemberInfo {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            email: m.email,
            display_name: m.display_name,
            role: m.role,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Insert payload for a new member row (password already hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    pub email: String,
    pub display_name: String,
    pub hash_pass: String,
    pub role: MemberRole,
    pub status: MemberStatus,
}

/// Registration payload
///
/// `invite_token` joins the new PENDING member to a sector. It may be
/// omitted only for the founding-admin bootstrap (empty member table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub invite_token: Option<String>,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub member: MemberInfo,
}

/// Update own profile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub display_name: Option<String>,
    pub password: Option<String>,
}

/// Role promotion payload (LEADER or ADMIN)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub role: MemberRole,
}

/// Points earned within one sector (profile breakdown line)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorPointsEntry {
    pub sector_id: i64,
    pub sector_name: String,
    pub points: i64,
}

/// Own profile with per-sector points breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
    #[serde(flatten)]
    pub member: MemberInfo,
    pub total_points: i64,
    pub sectors: Vec<SectorPointsEntry>,
}

/// Attendance line for the member summary view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceDetail {
    pub activity_id: i64,
    pub activity_title: String,
    pub points_value: i64,
    pub scheduled_at: i64,
    pub recorded_at: i64,
}

/// Redemption line for the member summary view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RedemptionDetail {
    pub code_id: i64,
    pub token: String,
    pub points_value: i64,
    pub kind: CodeKind,
    pub redeemed_at: i64,
}

/// Per-member breakdown for leader/admin views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSummary {
    #[serde(flatten)]
    pub member: MemberInfo,
    pub total_points: i64,
    pub attendance: Vec<AttendanceDetail>,
    pub redemptions: Vec<RedemptionDetail>,
}
