//! Redeem Code Repository
//!
//! Redeemable codes and the budget transfer ledger. Transfers are
//! pre-redeemed UNIQUE rows with `origin = 'TRANSFER'`, always global,
//! so they count toward the organization total but never a sector's.

use super::{RepoError, RepoResult, validate_points};
use shared::models::{CodeCreate, CodeKind, RedeemCode, RedemptionDetail};
use sqlx::SqlitePool;

const CODE_SELECT: &str = "SELECT id, token, points_value, kind, is_redeemed, redeemed_at, sector_id, is_global, assigned_member_id, origin, note, created_by, created_at FROM redeem_code";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<RedeemCode>> {
    let sql = format!("{} WHERE id = ?", CODE_SELECT);
    let row = sqlx::query_as::<_, RedeemCode>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_token(pool: &SqlitePool, token: &str) -> RepoResult<Option<RedeemCode>> {
    let sql = format!("{} WHERE token = ?", CODE_SELECT);
    let row = sqlx::query_as::<_, RedeemCode>(&sql)
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a redeem code with an already-resolved scope
///
/// Token collisions surface as [`RepoError::Duplicate`] so the caller
/// can regenerate and retry.
pub async fn create(
    pool: &SqlitePool,
    data: CodeCreate,
    token: &str,
    sector_id: Option<i64>,
    is_global: bool,
    created_by: i64,
) -> RepoResult<RedeemCode> {
    validate_points(data.points_value, "Code points")?;
    match data.kind {
        CodeKind::Unique => {
            let assignee = data.assigned_member_id.ok_or_else(|| {
                RepoError::Validation("UNIQUE codes require assigned_member_id".into())
            })?;
            super::member::find_by_id(pool, assignee)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Member {assignee} not found")))?;
        }
        CodeKind::General => {
            if data.assigned_member_id.is_some() {
                return Err(RepoError::Validation(
                    "GENERAL codes cannot have an assignee".into(),
                ));
            }
        }
    }

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT INTO redeem_code (id, token, points_value, kind, is_redeemed, redeemed_at, sector_id, is_global, assigned_member_id, origin, note, created_by, created_at) VALUES (?, ?, ?, ?, 0, NULL, ?, ?, ?, 'CODE', ?, ?, ?)",
    )
    .bind(id)
    .bind(token)
    .bind(data.points_value)
    .bind(data.kind)
    .bind(sector_id)
    .bind(is_global)
    .bind(data.assigned_member_id)
    .bind(&data.note)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if super::is_unique_violation(&e) {
            return Err(RepoError::Duplicate("Code token collision".into()));
        }
        return Err(e.into());
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create code".into()))
}

/// Redeem a code for a member, returning the points granted
///
/// UNIQUE codes flip their own `is_redeemed` flag under a guard;
/// GENERAL codes insert a per-member join row. Either way the UNIQUE
/// constraint makes exactly one of two racing redemptions win.
pub async fn redeem(pool: &SqlitePool, member_id: i64, token: &str) -> RepoResult<i64> {
    let code = find_by_token(pool, token)
        .await?
        .ok_or_else(|| RepoError::NotFound("Unknown code".into()))?;

    if !code.is_global
        && let Some(sector_id) = code.sector_id
        && !super::sector::is_member(pool, sector_id, member_id).await?
    {
        return Err(RepoError::ScopeViolation(format!(
            "Member {member_id} is not in sector {sector_id}"
        )));
    }

    let now = shared::util::now_millis();
    match code.kind {
        CodeKind::Unique => {
            if code.assigned_member_id != Some(member_id) {
                return Err(RepoError::NotAssignee(format!(
                    "Code {} is assigned to another member",
                    code.id
                )));
            }
            let rows = sqlx::query(
                "UPDATE redeem_code SET is_redeemed = 1, redeemed_at = ? WHERE id = ? AND is_redeemed = 0",
            )
            .bind(now)
            .bind(code.id)
            .execute(pool)
            .await?;
            if rows.rows_affected() == 0 {
                return Err(RepoError::AlreadyRedeemed(format!(
                    "Code {} was already redeemed",
                    code.id
                )));
            }
        }
        CodeKind::General => {
            let redeemed = sqlx::query_scalar::<_, i64>(
                "SELECT EXISTS(SELECT 1 FROM general_redemption WHERE member_id = ? AND code_id = ?)",
            )
            .bind(member_id)
            .bind(code.id)
            .fetch_one(pool)
            .await?;
            if redeemed != 0 {
                return Err(RepoError::AlreadyRedeemed(format!(
                    "Member {member_id} already redeemed code {}",
                    code.id
                )));
            }

            let result = sqlx::query(
                "INSERT INTO general_redemption (id, member_id, code_id, redeemed_at) VALUES (?, ?, ?, ?)",
            )
            .bind(shared::util::snowflake_id())
            .bind(member_id)
            .bind(code.id)
            .bind(now)
            .execute(pool)
            .await;

            if let Err(e) = result {
                if super::is_unique_violation(&e) {
                    return Err(RepoError::AlreadyRedeemed(format!(
                        "Member {member_id} already redeemed code {}",
                        code.id
                    )));
                }
                return Err(e.into());
            }
        }
    }

    Ok(code.points_value)
}

/// Move points from a leader's budget to a member
///
/// One transaction: a guarded debit (`budget >= points`, 0 rows means
/// insufficient funds) followed by the pre-redeemed TRANSFER row. A
/// partial application is never observable.
pub async fn distribute(
    pool: &SqlitePool,
    leader_id: i64,
    target_member_id: i64,
    points: i64,
    note: Option<String>,
) -> RepoResult<RedeemCode> {
    validate_points(points, "Transfer points")?;

    super::member::find_by_id(pool, target_member_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {target_member_id} not found")))?;

    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE member SET budget = budget - ?1, updated_at = ?2 WHERE id = ?3 AND budget >= ?1",
    )
    .bind(points)
    .bind(now)
    .bind(leader_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::InsufficientBudget(format!(
            "Budget below {points} points"
        )));
    }

    sqlx::query(
        "INSERT INTO redeem_code (id, token, points_value, kind, is_redeemed, redeemed_at, sector_id, is_global, assigned_member_id, origin, note, created_by, created_at) VALUES (?, ?, ?, 'UNIQUE', 1, ?, NULL, 1, ?, 'TRANSFER', ?, ?, ?)",
    )
    .bind(id)
    .bind(shared::util::code_token())
    .bind(points)
    .bind(now)
    .bind(target_member_id)
    .bind(&note)
    .bind(leader_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record transfer".into()))
}

/// Codes created by a member (transfers excluded), newest first
pub async fn list_by_creator(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<RedeemCode>> {
    let sql = format!(
        "{} WHERE created_by = ? AND origin = 'CODE' ORDER BY created_at DESC",
        CODE_SELECT
    );
    let rows = sqlx::query_as::<_, RedeemCode>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Redemption lines for a member summary, newest first
///
/// Unions the member's GENERAL redemptions with their redeemed UNIQUE
/// codes (transfers included).
pub async fn redemption_details(
    pool: &SqlitePool,
    member_id: i64,
) -> RepoResult<Vec<RedemptionDetail>> {
    let rows = sqlx::query_as::<_, RedemptionDetail>(
        "SELECT c.id AS code_id, c.token, c.points_value, c.kind, gr.redeemed_at FROM general_redemption gr JOIN redeem_code c ON gr.code_id = c.id WHERE gr.member_id = ?1 UNION ALL SELECT c.id AS code_id, c.token, c.points_value, c.kind, COALESCE(c.redeemed_at, c.created_at) AS redeemed_at FROM redeem_code c WHERE c.assigned_member_id = ?1 AND c.is_redeemed = 1 ORDER BY redeemed_at DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE member (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                hash_pass TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'REGULAR',
                status TEXT NOT NULL DEFAULT 'PENDING',
                budget INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE sector_member (
                id INTEGER PRIMARY KEY,
                sector_id INTEGER NOT NULL,
                member_id INTEGER NOT NULL,
                joined_at INTEGER NOT NULL DEFAULT 0,
                UNIQUE(member_id, sector_id)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE redeem_code (
                id INTEGER PRIMARY KEY,
                token TEXT NOT NULL UNIQUE,
                points_value INTEGER NOT NULL,
                kind TEXT NOT NULL,
                is_redeemed INTEGER NOT NULL DEFAULT 0,
                redeemed_at INTEGER,
                sector_id INTEGER,
                is_global INTEGER NOT NULL DEFAULT 0,
                assigned_member_id INTEGER,
                origin TEXT NOT NULL DEFAULT 'CODE',
                note TEXT,
                created_by INTEGER NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE general_redemption (
                id INTEGER PRIMARY KEY,
                member_id INTEGER NOT NULL,
                code_id INTEGER NOT NULL,
                redeemed_at INTEGER NOT NULL DEFAULT 0,
                UNIQUE(member_id, code_id)
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        // Member 1: leader; member 2: regular in sector 10; member 3: regular, no sector
        sqlx::query("INSERT INTO member (id, email, display_name, hash_pass, role, status) VALUES (1, 'lead@x.org', 'Lea', 'x', 'LEADER', 'ACTIVE')")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO member (id, email, display_name, hash_pass, role, status) VALUES (2, 'in@x.org', 'Ina', 'x', 'REGULAR', 'ACTIVE')")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO member (id, email, display_name, hash_pass, role, status) VALUES (3, 'out@x.org', 'Out', 'x', 'REGULAR', 'ACTIVE')")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO sector_member (sector_id, member_id, joined_at) VALUES (10, 2, 0)")
            .execute(&pool).await.unwrap();

        pool
    }

    fn general_code(points: i64) -> CodeCreate {
        CodeCreate {
            points_value: points,
            kind: CodeKind::General,
            assigned_member_id: None,
            sector_id: None,
            general: None,
            note: None,
        }
    }

    fn unique_code(points: i64, assignee: i64) -> CodeCreate {
        CodeCreate {
            points_value: points,
            kind: CodeKind::Unique,
            assigned_member_id: Some(assignee),
            sector_id: None,
            general: None,
            note: None,
        }
    }

    async fn set_budget(pool: &SqlitePool, member_id: i64, budget: i64) {
        sqlx::query("UPDATE member SET budget = ? WHERE id = ?")
            .bind(budget)
            .bind(member_id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn budget_of(pool: &SqlitePool, member_id: i64) -> i64 {
        sqlx::query_scalar("SELECT budget FROM member WHERE id = ?")
            .bind(member_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_stores_code_fields() {
        let pool = test_pool().await;
        let c = create(&pool, general_code(25), "GEN25", None, true, 1)
            .await
            .unwrap();
        assert_eq!(c.token, "GEN25");
        assert_eq!(c.kind, CodeKind::General);
        assert_eq!(c.origin, shared::models::CodeOrigin::Code);
        assert!(!c.is_redeemed);
        assert!(c.is_global);
    }

    #[tokio::test]
    async fn test_create_kind_constraints() {
        let pool = test_pool().await;

        // UNIQUE without assignee
        let mut bad = unique_code(10, 2);
        bad.assigned_member_id = None;
        assert!(matches!(
            create(&pool, bad, "T1", None, true, 1).await.unwrap_err(),
            RepoError::Validation(_)
        ));

        // UNIQUE with unknown assignee
        assert!(matches!(
            create(&pool, unique_code(10, 999), "T2", None, true, 1)
                .await
                .unwrap_err(),
            RepoError::NotFound(_)
        ));

        // GENERAL with assignee
        let mut bad = general_code(10);
        bad.assigned_member_id = Some(2);
        assert!(matches!(
            create(&pool, bad, "T3", None, true, 1).await.unwrap_err(),
            RepoError::Validation(_)
        ));

        // Non-positive points
        assert!(matches!(
            create(&pool, general_code(0), "T4", None, true, 1)
                .await
                .unwrap_err(),
            RepoError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_token() {
        let pool = test_pool().await;
        create(&pool, general_code(10), "SAME", None, true, 1)
            .await
            .unwrap();
        assert!(matches!(
            create(&pool, general_code(10), "SAME", None, true, 1)
                .await
                .unwrap_err(),
            RepoError::Duplicate(_)
        ));
    }

    #[tokio::test]
    async fn test_redeem_general_once_per_member() {
        let pool = test_pool().await;
        create(&pool, general_code(25), "GEN", None, true, 1)
            .await
            .unwrap();

        assert_eq!(redeem(&pool, 2, "GEN").await.unwrap(), 25);
        assert!(matches!(
            redeem(&pool, 2, "GEN").await.unwrap_err(),
            RepoError::AlreadyRedeemed(_)
        ));
        // Another member can still redeem the same GENERAL code
        assert_eq!(redeem(&pool, 3, "GEN").await.unwrap(), 25);

        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM general_redemption WHERE member_id = 2")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_redeem_unique_assignee_only() {
        let pool = test_pool().await;
        create(&pool, unique_code(40, 2), "UNQ", None, true, 1)
            .await
            .unwrap();

        assert!(matches!(
            redeem(&pool, 3, "UNQ").await.unwrap_err(),
            RepoError::NotAssignee(_)
        ));
        assert_eq!(redeem(&pool, 2, "UNQ").await.unwrap(), 40);
        assert!(matches!(
            redeem(&pool, 2, "UNQ").await.unwrap_err(),
            RepoError::AlreadyRedeemed(_)
        ));

        let code = find_by_token(&pool, "UNQ").await.unwrap().unwrap();
        assert!(code.is_redeemed);
        assert!(code.redeemed_at.is_some());
    }

    #[tokio::test]
    async fn test_redeem_scope_violation() {
        let pool = test_pool().await;
        create(&pool, general_code(10), "SEC", Some(10), false, 1)
            .await
            .unwrap();

        // Member 3 is not in sector 10
        assert!(matches!(
            redeem(&pool, 3, "SEC").await.unwrap_err(),
            RepoError::ScopeViolation(_)
        ));
        assert_eq!(redeem(&pool, 2, "SEC").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_redeem_unknown_token() {
        let pool = test_pool().await;
        assert!(matches!(
            redeem(&pool, 2, "NOPE").await.unwrap_err(),
            RepoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_distribute_exact_budget_leaves_zero() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 20).await;

        let transfer = distribute(&pool, 1, 2, 20, Some("well done".into()))
            .await
            .unwrap();
        assert_eq!(budget_of(&pool, 1).await, 0);
        assert_eq!(transfer.points_value, 20);
        assert_eq!(transfer.kind, CodeKind::Unique);
        assert_eq!(transfer.origin, shared::models::CodeOrigin::Transfer);
        assert!(transfer.is_redeemed);
        assert!(transfer.is_global);
        assert_eq!(transfer.sector_id, None);
        assert_eq!(transfer.assigned_member_id, Some(2));
        assert_eq!(transfer.note.as_deref(), Some("well done"));
    }

    #[tokio::test]
    async fn test_distribute_insufficient_budget_changes_nothing() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 19).await;

        assert!(matches!(
            distribute(&pool, 1, 2, 20, None).await.unwrap_err(),
            RepoError::InsufficientBudget(_)
        ));

        assert_eq!(budget_of(&pool, 1).await, 19);
        let codes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redeem_code")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(codes, 0);
    }

    #[tokio::test]
    async fn test_distribute_validates_input() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 50).await;

        assert!(matches!(
            distribute(&pool, 1, 2, 0, None).await.unwrap_err(),
            RepoError::Validation(_)
        ));
        assert!(matches!(
            distribute(&pool, 1, 999, 10, None).await.unwrap_err(),
            RepoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_transfer_token_cannot_be_redeemed_again() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 50).await;
        let transfer = distribute(&pool, 1, 2, 10, None).await.unwrap();

        assert!(matches!(
            redeem(&pool, 2, &transfer.token).await.unwrap_err(),
            RepoError::AlreadyRedeemed(_)
        ));
    }

    #[tokio::test]
    async fn test_list_by_creator_excludes_transfers() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 50).await;
        create(&pool, general_code(10), "C1", None, true, 1)
            .await
            .unwrap();
        distribute(&pool, 1, 2, 10, None).await.unwrap();

        let codes = list_by_creator(&pool, 1).await.unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].token, "C1");
    }

    #[tokio::test]
    async fn test_redemption_details_spans_both_kinds() {
        let pool = test_pool().await;
        set_budget(&pool, 1, 50).await;
        create(&pool, general_code(25), "GEN", None, true, 1)
            .await
            .unwrap();
        redeem(&pool, 2, "GEN").await.unwrap();
        distribute(&pool, 1, 2, 10, None).await.unwrap();

        let details = redemption_details(&pool, 2).await.unwrap();
        assert_eq!(details.len(), 2);
        let total: i64 = details.iter().map(|d| d.points_value).sum();
        assert_eq!(total, 35);
    }
}
