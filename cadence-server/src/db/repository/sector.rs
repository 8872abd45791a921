//! Sector Repository

use super::{RepoError, RepoResult};
use shared::models::{MemberRole, Sector, SectorMemberEntry, SectorWithLeader};
use sqlx::SqlitePool;

const SECTOR_SELECT: &str =
    "SELECT id, name, invite_token, leader_id, created_at, updated_at FROM sector";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Sector>> {
    let sql = format!("{} WHERE id = ?", SECTOR_SELECT);
    let row = sqlx::query_as::<_, Sector>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_invite_token(pool: &SqlitePool, token: &str) -> RepoResult<Option<Sector>> {
    let sql = format!("{} WHERE invite_token = ?", SECTOR_SELECT);
    let row = sqlx::query_as::<_, Sector>(&sql)
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a sector; `invite_token` collisions surface as [`RepoError::Duplicate`]
/// so the caller can regenerate and retry.
pub async fn create(pool: &SqlitePool, name: &str, invite_token: &str) -> RepoResult<Sector> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let result = sqlx::query(
        "INSERT INTO sector (id, name, invite_token, leader_id, created_at, updated_at) VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
    )
    .bind(id)
    .bind(name)
    .bind(invite_token)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if super::is_unique_violation(&e) {
            return Err(RepoError::Duplicate("Invite token collision".into()));
        }
        return Err(e.into());
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create sector".into()))
}

pub async fn find_all_with_leader(pool: &SqlitePool) -> RepoResult<Vec<SectorWithLeader>> {
    let rows = sqlx::query_as::<_, SectorWithLeader>(
        "SELECT s.id, s.name, s.invite_token, s.leader_id, m.display_name AS leader_name, (SELECT COUNT(*) FROM sector_member sm WHERE sm.sector_id = s.id) AS member_count, s.created_at, s.updated_at FROM sector s LEFT JOIN member m ON s.leader_id = m.id ORDER BY s.name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Point a sector at a new leader
///
/// The member must already hold the LEADER role; assignment never
/// promotes. The leader is added to the sector roster if missing.
pub async fn assign_leader(
    pool: &SqlitePool,
    sector_id: i64,
    member_id: i64,
) -> RepoResult<Sector> {
    find_by_id(pool, sector_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Sector {sector_id} not found")))?;
    let member = super::member::find_by_id(pool, member_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {member_id} not found")))?;
    if member.role != MemberRole::Leader {
        return Err(RepoError::RoleViolation(format!(
            "Member {member_id} does not hold the LEADER role"
        )));
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE sector SET leader_id = ?, updated_at = ? WHERE id = ?")
        .bind(member_id)
        .bind(now)
        .bind(sector_id)
        .execute(&mut *tx)
        .await?;

    // Leaders sit on their own roster
    sqlx::query(
        "INSERT OR IGNORE INTO sector_member (id, sector_id, member_id, joined_at) VALUES (?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(sector_id)
    .bind(member_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, sector_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Sector {sector_id} not found")))
}

/// Put a member on a sector roster
pub async fn add_member(pool: &SqlitePool, sector_id: i64, member_id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "INSERT INTO sector_member (id, sector_id, member_id, joined_at) VALUES (?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(sector_id)
    .bind(member_id)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(e) = result {
        if super::is_unique_violation(&e) {
            return Err(RepoError::Duplicate(format!(
                "Member {member_id} already belongs to sector {sector_id}"
            )));
        }
        return Err(e.into());
    }
    Ok(())
}

/// Drop a member from a roster
///
/// The current leader stays on the roster; demote them first.
pub async fn remove_member(pool: &SqlitePool, sector_id: i64, member_id: i64) -> RepoResult<()> {
    let leads = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM sector WHERE id = ? AND leader_id = ?)",
    )
    .bind(sector_id)
    .bind(member_id)
    .fetch_one(pool)
    .await?;
    if leads != 0 {
        return Err(RepoError::InvalidState(format!(
            "Member {member_id} leads sector {sector_id} and cannot leave its roster"
        )));
    }

    let rows = sqlx::query("DELETE FROM sector_member WHERE sector_id = ? AND member_id = ?")
        .bind(sector_id)
        .bind(member_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Member {member_id} is not on the roster of sector {sector_id}"
        )));
    }
    Ok(())
}

pub async fn members(pool: &SqlitePool, sector_id: i64) -> RepoResult<Vec<SectorMemberEntry>> {
    let rows = sqlx::query_as::<_, SectorMemberEntry>(
        "SELECT m.id, m.email, m.display_name, m.role, m.status, sm.joined_at FROM sector_member sm JOIN member m ON sm.member_id = m.id WHERE sm.sector_id = ? ORDER BY sm.joined_at ASC",
    )
    .bind(sector_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn is_member(pool: &SqlitePool, sector_id: i64, member_id: i64) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM sector_member WHERE sector_id = ? AND member_id = ?)",
    )
    .bind(sector_id)
    .bind(member_id)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

/// Sectors the member currently leads
pub async fn find_led_sectors(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<Sector>> {
    let sql = format!("{} WHERE leader_id = ? ORDER BY name ASC", SECTOR_SELECT);
    let rows = sqlx::query_as::<_, Sector>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// True when `member_id` belongs to at least one sector led by `leader_id`
pub async fn leads_member(
    pool: &SqlitePool,
    leader_id: i64,
    member_id: i64,
) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM sector_member sm JOIN sector s ON s.id = sm.sector_id WHERE sm.member_id = ? AND s.leader_id = ?)",
    )
    .bind(member_id)
    .bind(leader_id)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

/// Resolve `(sector_id, is_global)` for a new activity or redeem code
///
/// Admins default to global and may pin any sector; leaders default to
/// their led sector and must name one explicitly when they lead several.
/// `general = true` forces global scope for either role.
pub async fn resolve_scope(
    pool: &SqlitePool,
    creator_id: i64,
    role: MemberRole,
    sector_id: Option<i64>,
    general: Option<bool>,
) -> RepoResult<(Option<i64>, bool)> {
    if general.unwrap_or(false) {
        return Ok((None, true));
    }

    if let Some(sector_id) = sector_id {
        let sector = find_by_id(pool, sector_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Sector {sector_id} not found")))?;
        if role != MemberRole::Admin && sector.leader_id != Some(creator_id) {
            return Err(RepoError::ScopeViolation(format!(
                "Sector {sector_id} is not led by member {creator_id}"
            )));
        }
        return Ok((Some(sector.id), false));
    }

    match role {
        MemberRole::Admin => Ok((None, true)),
        MemberRole::Leader => {
            let led = find_led_sectors(pool, creator_id).await?;
            match led.len() {
                0 => Err(RepoError::RoleViolation(format!(
                    "Member {creator_id} leads no sector"
                ))),
                1 => Ok((Some(led[0].id), false)),
                _ => Err(RepoError::Validation(
                    "Leading several sectors; specify sector_id".into(),
                )),
            }
        }
        MemberRole::Regular => Err(RepoError::RoleViolation(
            "Only leaders and admins create scoped records".into(),
        )),
    }
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
            "CREATE TABLE sector (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                invite_token TEXT NOT NULL UNIQUE,
                leader_id INTEGER,
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

        // Seed: one leader, one regular
        sqlx::query("INSERT INTO member (id, email, display_name, hash_pass, role, status) VALUES (1, 'lead@x.org', 'Lea', 'x', 'LEADER', 'ACTIVE')")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO member (id, email, display_name, hash_pass, role, status) VALUES (2, 'reg@x.org', 'Rui', 'x', 'REGULAR', 'ACTIVE')")
            .execute(&pool).await.unwrap();

        pool
    }

    #[tokio::test]
    async fn test_create_and_find_by_token() {
        let pool = test_pool().await;
        let s = create(&pool, "Robotics", "INV-TOKEN-1").await.unwrap();
        assert_eq!(s.name, "Robotics");
        assert_eq!(s.leader_id, None);

        let found = find_by_invite_token(&pool, "INV-TOKEN-1").await.unwrap();
        assert_eq!(found.unwrap().id, s.id);
        assert!(find_by_invite_token(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_token_is_duplicate() {
        let pool = test_pool().await;
        create(&pool, "Robotics", "SAME").await.unwrap();
        let err = create(&pool, "Chess", "SAME").await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_assign_leader_requires_leader_role() {
        let pool = test_pool().await;
        let s = create(&pool, "Robotics", "TOK1").await.unwrap();

        assert!(matches!(
            assign_leader(&pool, s.id, 2).await.unwrap_err(),
            RepoError::RoleViolation(_)
        ));
        assert!(matches!(
            assign_leader(&pool, s.id, 99).await.unwrap_err(),
            RepoError::NotFound(_)
        ));
        assert!(matches!(
            assign_leader(&pool, 999, 1).await.unwrap_err(),
            RepoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_assign_leader_joins_roster() {
        let pool = test_pool().await;
        let s = create(&pool, "Robotics", "TOK1").await.unwrap();

        let updated = assign_leader(&pool, s.id, 1).await.unwrap();
        assert_eq!(updated.leader_id, Some(1));
        assert!(is_member(&pool, s.id, 1).await.unwrap());

        // Re-assign is idempotent on the roster
        assign_leader(&pool, s.id, 1).await.unwrap();
        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sector_member WHERE sector_id = ? AND member_id = 1",
        )
        .bind(s.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_add_member_twice_is_duplicate() {
        let pool = test_pool().await;
        let s = create(&pool, "Chess", "TOK2").await.unwrap();
        add_member(&pool, s.id, 2).await.unwrap();
        assert!(matches!(
            add_member(&pool, s.id, 2).await.unwrap_err(),
            RepoError::Duplicate(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_member() {
        let pool = test_pool().await;
        let s = create(&pool, "Chess", "TOK2").await.unwrap();
        add_member(&pool, s.id, 2).await.unwrap();

        remove_member(&pool, s.id, 2).await.unwrap();
        assert!(!is_member(&pool, s.id, 2).await.unwrap());
        assert!(matches!(
            remove_member(&pool, s.id, 2).await.unwrap_err(),
            RepoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_member_refuses_current_leader() {
        let pool = test_pool().await;
        let s = create(&pool, "Chess", "TOK2").await.unwrap();
        assign_leader(&pool, s.id, 1).await.unwrap();

        assert!(matches!(
            remove_member(&pool, s.id, 1).await.unwrap_err(),
            RepoError::InvalidState(_)
        ));
        assert!(is_member(&pool, s.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_members_roster_in_join_order() {
        let pool = test_pool().await;
        let s = create(&pool, "Chess", "TOK2").await.unwrap();
        sqlx::query("INSERT INTO sector_member (sector_id, member_id, joined_at) VALUES (?, 2, 100)")
            .bind(s.id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sector_member (sector_id, member_id, joined_at) VALUES (?, 1, 50)")
            .bind(s.id)
            .execute(&pool)
            .await
            .unwrap();

        let roster = members(&pool, s.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, 1);
        assert_eq!(roster[1].id, 2);
    }

    #[tokio::test]
    async fn test_find_led_sectors() {
        let pool = test_pool().await;
        let a = create(&pool, "Robotics", "TOKA").await.unwrap();
        let b = create(&pool, "Chess", "TOKB").await.unwrap();
        create(&pool, "Drama", "TOKC").await.unwrap();
        assign_leader(&pool, a.id, 1).await.unwrap();
        assign_leader(&pool, b.id, 1).await.unwrap();

        let led = find_led_sectors(&pool, 1).await.unwrap();
        assert_eq!(led.len(), 2);
        // Ordered by name
        assert_eq!(led[0].name, "Chess");
        assert_eq!(led[1].name, "Robotics");
    }

    #[tokio::test]
    async fn test_resolve_scope_defaults_by_role() {
        let pool = test_pool().await;
        let s = create(&pool, "Robotics", "TOKA").await.unwrap();
        assign_leader(&pool, s.id, 1).await.unwrap();

        // Admin defaults to global
        let scope = resolve_scope(&pool, 9, MemberRole::Admin, None, None)
            .await
            .unwrap();
        assert_eq!(scope, (None, true));

        // Leader of one sector defaults to it
        let scope = resolve_scope(&pool, 1, MemberRole::Leader, None, None)
            .await
            .unwrap();
        assert_eq!(scope, (Some(s.id), false));

        // general = true forces global
        let scope = resolve_scope(&pool, 1, MemberRole::Leader, None, Some(true))
            .await
            .unwrap();
        assert_eq!(scope, (None, true));
    }

    #[tokio::test]
    async fn test_resolve_scope_leader_constraints() {
        let pool = test_pool().await;
        let a = create(&pool, "Robotics", "TOKA").await.unwrap();
        let b = create(&pool, "Chess", "TOKB").await.unwrap();

        // Leads nothing
        assert!(matches!(
            resolve_scope(&pool, 1, MemberRole::Leader, None, None)
                .await
                .unwrap_err(),
            RepoError::RoleViolation(_)
        ));

        // Explicit sector the leader does not lead
        assign_leader(&pool, a.id, 1).await.unwrap();
        assert!(matches!(
            resolve_scope(&pool, 1, MemberRole::Leader, Some(b.id), None)
                .await
                .unwrap_err(),
            RepoError::ScopeViolation(_)
        ));

        // Two led sectors and no explicit choice
        assign_leader(&pool, b.id, 1).await.unwrap();
        assert!(matches!(
            resolve_scope(&pool, 1, MemberRole::Leader, None, None)
                .await
                .unwrap_err(),
            RepoError::Validation(_)
        ));

        // Unknown explicit sector
        assert!(matches!(
            resolve_scope(&pool, 1, MemberRole::Leader, Some(999), None)
                .await
                .unwrap_err(),
            RepoError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_find_all_with_leader() {
        let pool = test_pool().await;
        let a = create(&pool, "Robotics", "TOKA").await.unwrap();
        create(&pool, "Chess", "TOKB").await.unwrap();
        assign_leader(&pool, a.id, 1).await.unwrap();
        add_member(&pool, a.id, 2).await.unwrap();

        let all = find_all_with_leader(&pool).await.unwrap();
        assert_eq!(all.len(), 2);

        let chess = &all[0];
        assert_eq!(chess.name, "Chess");
        assert_eq!(chess.leader_name, None);
        assert_eq!(chess.member_count, 0);

        let robotics = &all[1];
        assert_eq!(robotics.leader_name.as_deref(), Some("Lea"));
        assert_eq!(robotics.member_count, 2);
    }
}
