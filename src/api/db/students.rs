//! Student accounts. The registration number is the primary key and the
//! whole login credential; deleting a student cascades to semesters,
//! courses, CGPA history and the dues record.

use sqlx::{Pool, Sqlite};

use super::super::domain::Level;
use super::super::err::PortalError;
use super::{now, table::Student};

pub struct NewStudent {
    pub reg_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level: Level,
}

pub struct ProfileUpdate {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level: Level,
    pub profile_image: Option<String>,
}

pub async fn register(pool: &Pool<Sqlite>, new: NewStudent) -> Result<Student, PortalError> {
    if new.reg_number.trim().is_empty() {
        return Err(PortalError::invalid(
            "reg_number",
            "registration number is required",
        ));
    }
    if new.full_name.trim().is_empty() {
        return Err(PortalError::invalid("full_name", "full name is required"));
    }
    if try_get(pool, &new.reg_number).await?.is_some() {
        return Err(PortalError::invalid(
            "reg_number",
            "a student with this registration number already exists",
        ));
    }

    let ts = now();
    sqlx::query(
        r"INSERT INTO students (reg_number, full_name, email, phone, level, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(new.reg_number.trim())
    .bind(new.full_name.trim())
    .bind(&new.email)
    .bind(&new.phone)
    .bind(new.level.as_str())
    .bind(ts)
    .execute(pool)
    .await?;

    get(pool, new.reg_number.trim()).await
}

pub async fn get(pool: &Pool<Sqlite>, reg_number: &str) -> Result<Student, PortalError> {
    try_get(pool, reg_number).await?.ok_or(PortalError::NotFound)
}

pub async fn try_get(
    pool: &Pool<Sqlite>,
    reg_number: &str,
) -> Result<Option<Student>, PortalError> {
    let student = sqlx::query_as(r"SELECT * FROM students WHERE reg_number = ?1")
        .bind(reg_number)
        .fetch_optional(pool)
        .await?;
    Ok(student)
}

/// Profile fields only; the registration number is never editable.
pub async fn update_profile(
    pool: &Pool<Sqlite>,
    reg_number: &str,
    update: ProfileUpdate,
) -> Result<Student, PortalError> {
    if update.full_name.trim().is_empty() {
        return Err(PortalError::invalid("full_name", "full name is required"));
    }
    let result = sqlx::query(
        r"UPDATE students
          SET full_name = ?1, email = ?2, phone = ?3, level = ?4, profile_image = ?5, updated_at = ?6
          WHERE reg_number = ?7",
    )
    .bind(update.full_name.trim())
    .bind(&update.email)
    .bind(&update.phone)
    .bind(update.level.as_str())
    .bind(&update.profile_image)
    .bind(now())
    .bind(reg_number)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    get(pool, reg_number).await
}

pub async fn delete(pool: &Pool<Sqlite>, reg_number: &str) -> Result<(), PortalError> {
    let result = sqlx::query(r"DELETE FROM students WHERE reg_number = ?1")
        .bind(reg_number)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::test_pool;
    use super::*;

    pub(crate) fn sample(reg: &str) -> NewStudent {
        NewStudent {
            reg_number: reg.to_string(),
            full_name: "Ada Obi".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: None,
            level: Level::L200,
        }
    }

    #[tokio::test]
    async fn register_and_fetch() {
        let (_dir, pool) = test_pool().await;
        let student = register(&pool, sample("2020/1/12345")).await.unwrap();
        assert_eq!(student.reg_number, "2020/1/12345");
        assert_eq!(student.level, "200");

        let fetched = get(&pool, "2020/1/12345").await.unwrap();
        assert_eq!(fetched.full_name, "Ada Obi");
    }

    #[tokio::test]
    async fn duplicate_reg_number_is_rejected() {
        let (_dir, pool) = test_pool().await;
        register(&pool, sample("2020/1/12345")).await.unwrap();
        let err = register(&pool, sample("2020/1/12345")).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "reg_number"));
    }

    #[tokio::test]
    async fn profile_update_keeps_reg_number() {
        let (_dir, pool) = test_pool().await;
        register(&pool, sample("2020/1/12345")).await.unwrap();
        let updated = update_profile(
            &pool,
            "2020/1/12345",
            ProfileUpdate {
                full_name: "Ada N. Obi".to_string(),
                email: None,
                phone: Some("08030000000".to_string()),
                level: Level::L300,
                profile_image: Some("https://img.example.com/ada.png".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.reg_number, "2020/1/12345");
        assert_eq!(updated.full_name, "Ada N. Obi");
        assert_eq!(updated.level, "300");
        assert_eq!(updated.email, None);
    }

    #[tokio::test]
    async fn unknown_student_is_not_found() {
        let (_dir, pool) = test_pool().await;
        assert!(matches!(
            get(&pool, "missing").await.unwrap_err(),
            PortalError::NotFound
        ));
        assert!(matches!(
            delete(&pool, "missing").await.unwrap_err(),
            PortalError::NotFound
        ));
    }
}
