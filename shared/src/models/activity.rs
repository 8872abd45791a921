//! Activity & Attendance Models

use serde::{Deserialize, Serialize};

/// How an activity is held
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ActivityModality {
    Remote,
    InPerson,
}

/// Activity entity (attendance-granting event)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub modality: ActivityModality,
    /// Required for IN_PERSON activities
    pub location: Option<String>,
    pub scheduled_at: i64,
    pub points_value: i64,
    /// NULL for global activities
    pub sector_id: Option<i64>,
    pub is_global: bool,
    pub created_by: i64,
    pub created_at: i64,
}

/// Create activity payload
///
/// Scope defaults by creator role (admin → global, leader → led sector);
/// `general = true` forces global, `sector_id` pins a sector explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreate {
    pub title: String,
    pub description: Option<String>,
    pub modality: ActivityModality,
    pub location: Option<String>,
    pub scheduled_at: i64,
    pub points_value: i64,
    pub sector_id: Option<i64>,
    pub general: Option<bool>,
}

/// Attendance record (one per member per activity)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceRecord {
    pub id: i64,
    pub member_id: i64,
    pub activity_id: i64,
    pub recorded_at: i64,
}
