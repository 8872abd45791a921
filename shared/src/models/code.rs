//! Redeem Code & Budget Models

use serde::{Deserialize, Serialize};

/// Redeem code kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CodeKind {
    /// Redeemable once per member
    General,
    /// Bound to one member, redeemable once total
    Unique,
}

/// How a code row came to exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CodeOrigin {
    /// Created as a redeemable code
    Code,
    /// Pre-redeemed record written by a budget distribution
    Transfer,
}

/// Redeem code entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RedeemCode {
    pub id: i64,
    pub token: String,
    pub points_value: i64,
    pub kind: CodeKind,
    /// Meaningful for UNIQUE codes only; GENERAL redemptions live in their own table
    pub is_redeemed: bool,
    /// Set when a UNIQUE code is redeemed (TRANSFER rows are born redeemed)
    pub redeemed_at: Option<i64>,
    /// NULL for global codes
    pub sector_id: Option<i64>,
    pub is_global: bool,
    /// UNIQUE codes only
    pub assigned_member_id: Option<i64>,
    pub origin: CodeOrigin,
    pub note: Option<String>,
    pub created_by: i64,
    pub created_at: i64,
}

/// Create redeem code payload
///
/// Token is generated server-side. Scope defaults by creator role
/// (`general` / `sector_id` override as for activities). UNIQUE kind
/// requires `assigned_member_id`; GENERAL kind forbids it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeCreate {
    pub points_value: i64,
    pub kind: CodeKind,
    pub assigned_member_id: Option<i64>,
    pub sector_id: Option<i64>,
    pub general: Option<bool>,
    pub note: Option<String>,
}

/// Redeem payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub token: String,
}

/// One member's redemption of a GENERAL code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GeneralRedemption {
    pub id: i64,
    pub member_id: i64,
    pub code_id: i64,
    pub redeemed_at: i64,
}

/// Leader budget distribution payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributeRequest {
    pub member_id: i64,
    pub points: i64,
    pub note: Option<String>,
}

/// Admin budget top-up payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBudgetRequest {
    pub member_id: i64,
    pub points: i64,
}
