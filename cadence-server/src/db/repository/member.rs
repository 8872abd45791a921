//! Member Repository

use super::{RepoError, RepoResult, validate_points};
use shared::models::{Member, MemberCreate, MemberInfo, MemberRole};
use sqlx::SqlitePool;

const MEMBER_SELECT: &str = "SELECT id, email, display_name, hash_pass, role, status, budget, created_at, updated_at FROM member";

const MEMBER_INFO_SELECT: &str =
    "SELECT id, email, display_name, role, status, created_at FROM member";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let sql = format!("{} WHERE id = ?", MEMBER_SELECT);
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Member>> {
    let sql = format!("{} WHERE email = ?", MEMBER_SELECT);
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count_all(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM member")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<MemberInfo>> {
    let sql = format!("{} ORDER BY created_at DESC", MEMBER_INFO_SELECT);
    let rows = sqlx::query_as::<_, MemberInfo>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: MemberCreate) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT INTO member (id, email, display_name, hash_pass, role, status, budget, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
    )
    .bind(id)
    .bind(&data.email)
    .bind(&data.display_name)
    .bind(&data.hash_pass)
    .bind(data.role)
    .bind(data.status)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if super::is_unique_violation(&e) {
            return Err(RepoError::Duplicate("Email already registered".into()));
        }
        return Err(e.into());
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create member".into()))
}

/// Self-service profile update (display name and/or password hash)
pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    display_name: Option<String>,
    hash_pass: Option<String>,
) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE member SET display_name = COALESCE(?1, display_name), hash_pass = COALESCE(?2, hash_pass), updated_at = ?3 WHERE id = ?4",
    )
    .bind(display_name)
    .bind(hash_pass)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Flip a PENDING member to ACTIVE
pub async fn approve(pool: &SqlitePool, id: i64) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE member SET status = 'ACTIVE', updated_at = ? WHERE id = ? AND status = 'PENDING'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Member {id} not found"))),
            Some(_) => Err(RepoError::InvalidState(format!(
                "Member {id} is not pending approval"
            ))),
        };
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Raise a member to LEADER or ADMIN
///
/// Promotion implies approval: a PENDING member who gets promoted
/// becomes ACTIVE in the same statement.
pub async fn promote(pool: &SqlitePool, id: i64, role: MemberRole) -> RepoResult<Member> {
    if role == MemberRole::Regular {
        return Err(RepoError::Validation(
            "Promotion target role must be LEADER or ADMIN".into(),
        ));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE member SET role = ?, status = 'ACTIVE', updated_at = ? WHERE id = ?")
        .bind(role)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Drop a LEADER or ADMIN back to REGULAR
///
/// Clears any sector leadership held by the member in the same
/// transaction, so no sector ever points at a REGULAR leader.
pub async fn demote(pool: &SqlitePool, id: i64) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE member SET role = 'REGULAR', updated_at = ? WHERE id = ? AND role != 'REGULAR'",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Member {id} not found"))),
            Some(_) => Err(RepoError::InvalidState(format!(
                "Member {id} is already REGULAR"
            ))),
        };
    }

    sqlx::query("UPDATE sector SET leader_id = NULL, updated_at = ? WHERE leader_id = ?")
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Credit distributable budget to a LEADER
pub async fn add_budget(pool: &SqlitePool, id: i64, points: i64) -> RepoResult<Member> {
    validate_points(points, "Budget amount")?;

    let member = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))?;
    if member.role != MemberRole::Leader {
        return Err(RepoError::RoleViolation(format!(
            "Member {id} is not a LEADER and cannot hold budget"
        )));
    }

    let now = shared::util::now_millis();
    sqlx::query("UPDATE member SET budget = budget + ?, updated_at = ? WHERE id = ?")
        .bind(points)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// Discard a PENDING registration
///
/// Deletes the member row and its sector memberships. Members that
/// already accumulated ledger rows cannot be rejected.
pub async fn reject(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM sector_member WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM redeem_code WHERE assigned_member_id = ? AND is_redeemed = 0")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM member WHERE id = ? AND status = 'PENDING'")
        .bind(id)
        .execute(&mut *tx)
        .await;
    let rows = match result {
        Ok(rows) => rows,
        Err(e) if super::is_foreign_key_violation(&e) => {
            return Err(RepoError::InvalidState(format!(
                "Member {id} has ledger history and cannot be rejected"
            )));
        }
        Err(e) => return Err(e.into()),
    };
    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Member {id} not found"))),
            Some(_) => Err(RepoError::InvalidState(format!(
                "Member {id} is not pending; only pending registrations can be rejected"
            ))),
        };
    }

    tx.commit().await?;
    Ok(())
}

/// Remove a REGULAR member and every ledger row referencing them
///
/// Leaders and admins must be demoted first; their created activities
/// and codes keep `created_by` pointing at a live row.
pub async fn remove(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attendance_record WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM general_redemption WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM redeem_code WHERE assigned_member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sector_member WHERE member_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let rows = sqlx::query("DELETE FROM member WHERE id = ? AND role = 'REGULAR'")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Member {id} not found"))),
            Some(_) => Err(RepoError::RoleViolation(format!(
                "Member {id} holds a role; demote before removal"
            ))),
        };
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_pending(pool: &SqlitePool) -> RepoResult<Vec<MemberInfo>> {
    let sql = format!(
        "{} WHERE status = 'PENDING' ORDER BY created_at ASC",
        MEMBER_INFO_SELECT
    );
    let rows = sqlx::query_as::<_, MemberInfo>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Pending members across every sector the leader leads
pub async fn list_pending_for_leader(
    pool: &SqlitePool,
    leader_id: i64,
) -> RepoResult<Vec<MemberInfo>> {
    let rows = sqlx::query_as::<_, MemberInfo>(
        "SELECT DISTINCT m.id, m.email, m.display_name, m.role, m.status, m.created_at FROM member m JOIN sector_member sm ON sm.member_id = m.id JOIN sector s ON s.id = sm.sector_id WHERE s.leader_id = ? AND m.status = 'PENDING' ORDER BY m.created_at ASC",
    )
    .bind(leader_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
