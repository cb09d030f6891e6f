//! Academic calendars. At most one row is flagged active at a time; the
//! flag is maintained by the same transaction that writes the triggering
//! row, so a crash leaves either both effects or neither.

use sqlx::{Pool, Sqlite};

use super::super::err::PortalError;
use super::{now, table::AcademicCalendar};

pub struct CalendarInput {
    pub title: String,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: bool,
}

fn validate(input: &CalendarInput) -> Result<(), PortalError> {
    if input.title.trim().is_empty() {
        return Err(PortalError::invalid("title", "title is required"));
    }
    if input.academic_session.trim().is_empty() {
        return Err(PortalError::invalid(
            "academic_session",
            "academic session is required",
        ));
    }
    Ok(())
}

pub async fn create(
    pool: &Pool<Sqlite>,
    input: CalendarInput,
    uploaded_by: i64,
) -> Result<AcademicCalendar, PortalError> {
    validate(&input)?;
    let mut tx = pool.begin().await?;
    let ts = now();
    let calendar: AcademicCalendar = sqlx::query_as(
        r"INSERT INTO academic_calendars
          (title, academic_session, image, description, is_active, uploaded_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.academic_session.trim())
    .bind(&input.image)
    .bind(&input.description)
    .bind(input.is_active)
    .bind(uploaded_by)
    .bind(ts)
    .fetch_one(&mut *tx)
    .await?;
    if input.is_active {
        deactivate_others(&mut tx, calendar.id).await?;
    }
    tx.commit().await?;
    Ok(calendar)
}

pub async fn update(
    pool: &Pool<Sqlite>,
    id: i64,
    input: CalendarInput,
) -> Result<AcademicCalendar, PortalError> {
    validate(&input)?;
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r"UPDATE academic_calendars
          SET title = ?1, academic_session = ?2, image = ?3, description = ?4,
              is_active = ?5, updated_at = ?6
          WHERE id = ?7",
    )
    .bind(input.title.trim())
    .bind(input.academic_session.trim())
    .bind(&input.image)
    .bind(&input.description)
    .bind(input.is_active)
    .bind(now())
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    if input.is_active {
        deactivate_others(&mut tx, id).await?;
    }
    tx.commit().await?;
    get(pool, id).await
}

/// The single bulk update that keeps the invariant. Also repairs a table
/// that somehow ended up with several active rows.
async fn deactivate_others(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    keep_id: i64,
) -> Result<(), PortalError> {
    sqlx::query(r"UPDATE academic_calendars SET is_active = 0 WHERE id != ?1 AND is_active = 1")
        .bind(keep_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<AcademicCalendar, PortalError> {
    sqlx::query_as(r"SELECT * FROM academic_calendars WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound)
}

pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    let result = sqlx::query(r"DELETE FROM academic_calendars WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    Ok(())
}

pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<AcademicCalendar>, PortalError> {
    let calendars =
        sqlx::query_as(r"SELECT * FROM academic_calendars ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await?;
    Ok(calendars)
}

pub async fn active(pool: &Pool<Sqlite>) -> Result<Option<AcademicCalendar>, PortalError> {
    let calendar = sqlx::query_as(
        r"SELECT * FROM academic_calendars WHERE is_active = 1
          ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(calendar)
}

pub async fn recent(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<AcademicCalendar>, PortalError> {
    let calendars = sqlx::query_as(
        r"SELECT * FROM academic_calendars ORDER BY created_at DESC, id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(calendars)
}

#[cfg(test)]
mod tests {
    use super::super::testing::test_pool;
    use super::*;
    use crate::api::auth;

    fn input(title: &str, active: bool) -> CalendarInput {
        CalendarInput {
            title: title.to_string(),
            academic_session: "2023/2024".to_string(),
            image: "https://img.example.com/calendar.png".to_string(),
            description: None,
            is_active: active,
        }
    }

    async fn active_count(pool: &Pool<Sqlite>) -> i64 {
        sqlx::query_scalar(r"SELECT COUNT(*) FROM academic_calendars WHERE is_active = 1")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn creating_an_active_calendar_deactivates_the_rest() {
        let (_dir, pool) = test_pool().await;
        let admin = auth::create_admin(&pool, "registrar", "pw").await.unwrap().id;

        let first = create(&pool, input("2022/2023 calendar", true), admin).await.unwrap();
        assert!(first.is_active);
        let second = create(&pool, input("2023/2024 calendar", true), admin).await.unwrap();

        assert_eq!(active_count(&pool).await, 1);
        assert!(!get(&pool, first.id).await.unwrap().is_active);
        assert!(get(&pool, second.id).await.unwrap().is_active);
        assert_eq!(active(&pool).await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn inactive_saves_leave_the_flag_alone() {
        let (_dir, pool) = test_pool().await;
        let admin = auth::create_admin(&pool, "registrar", "pw").await.unwrap().id;

        let active_cal = create(&pool, input("active", true), admin).await.unwrap();
        create(&pool, input("draft", false), admin).await.unwrap();
        assert_eq!(active_count(&pool).await, 1);
        assert_eq!(active(&pool).await.unwrap().unwrap().id, active_cal.id);
    }

    #[tokio::test]
    async fn activating_repairs_a_corrupt_state() {
        let (_dir, pool) = test_pool().await;
        let admin = auth::create_admin(&pool, "registrar", "pw").await.unwrap().id;

        let a = create(&pool, input("a", false), admin).await.unwrap();
        let b = create(&pool, input("b", false), admin).await.unwrap();
        let c = create(&pool, input("c", false), admin).await.unwrap();
        // Simulate an invariant violation written behind the enforcer's back.
        sqlx::query(r"UPDATE academic_calendars SET is_active = 1")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(active_count(&pool).await, 3);

        update(&pool, b.id, input("b", true)).await.unwrap();
        assert_eq!(active_count(&pool).await, 1);
        assert!(get(&pool, b.id).await.unwrap().is_active);
        assert!(!get(&pool, a.id).await.unwrap().is_active);
        assert!(!get(&pool, c.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn update_with_flag_false_can_leave_zero_active() {
        let (_dir, pool) = test_pool().await;
        let admin = auth::create_admin(&pool, "registrar", "pw").await.unwrap().id;
        let only = create(&pool, input("only", true), admin).await.unwrap();
        update(&pool, only.id, input("only", false)).await.unwrap();
        assert_eq!(active_count(&pool).await, 0);
        assert!(active(&pool).await.unwrap().is_none());
    }
}
