//! The portal's two unrelated login mechanisms, both backed by
//! server-side session rows.
//!
//! Admins hold a username and a salted password digest. Students hold no
//! secret at all: possession of a registered registration number is the
//! whole credential, preserved from the system this replaces.

use sha2::{Digest, Sha256};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use super::db::{
    now,
    table::{AdminUser, PortalSession, Student},
};
use super::err::PortalError;

pub const STUDENT_SESSION_COOKIE: &str = "portal_student_session";
pub const ADMIN_SESSION_COOKIE: &str = "portal_admin_session";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionKind {
    Student,
    Admin,
}

impl SessionKind {
    fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Student => "student",
            SessionKind::Admin => "admin",
        }
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub async fn create_admin(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<AdminUser, PortalError> {
    if username.trim().is_empty() {
        return Err(PortalError::invalid("username", "username is required"));
    }
    if password.is_empty() {
        return Err(PortalError::invalid("password", "password is required"));
    }
    let duplicate: Option<i64> = sqlx::query_scalar(r"SELECT id FROM admin_users WHERE username = ?1")
        .bind(username.trim())
        .fetch_optional(pool)
        .await?;
    if duplicate.is_some() {
        return Err(PortalError::invalid("username", "username is taken"));
    }

    let salt = Uuid::new_v4().simple().to_string();
    let admin = sqlx::query_as(
        r"INSERT INTO admin_users (username, password_salt, password_digest, created_at)
          VALUES (?1, ?2, ?3, ?4) RETURNING *",
    )
    .bind(username.trim())
    .bind(&salt)
    .bind(digest(&salt, password))
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(admin)
}

/// Removing an admin leaves their uploads behind with the uploader
/// reference cleared (SET NULL on every content table).
pub async fn delete_admin(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    let result = sqlx::query(r"DELETE FROM admin_users WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    Ok(())
}

/// Seeds the first admin account from the environment when the table is
/// empty. A populated table is left alone.
pub async fn bootstrap_admin(
    pool: &Pool<Sqlite>,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<(), PortalError> {
    let (Some(username), Some(password)) = (username, password) else {
        return Ok(());
    };
    let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }
    create_admin(pool, username, password).await?;
    log::info!("seeded admin account {username}");
    Ok(())
}

pub async fn admin_login(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<(AdminUser, PortalSession), PortalError> {
    let admin: Option<AdminUser> = sqlx::query_as(r"SELECT * FROM admin_users WHERE username = ?1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    let Some(admin) = admin else {
        return Err(PortalError::InvalidCredentials(
            "Invalid username or password".to_string(),
        ));
    };
    if digest(&admin.password_salt, password) != admin.password_digest {
        return Err(PortalError::InvalidCredentials(
            "Invalid username or password".to_string(),
        ));
    }
    let session = open_session(pool, SessionKind::Admin, &admin.id.to_string()).await?;
    Ok((admin, session))
}

/// Student "login": the registration number must exist, nothing else is
/// checked. An unknown number creates no session.
pub async fn student_login(
    pool: &Pool<Sqlite>,
    reg_number: &str,
) -> Result<(Student, PortalSession), PortalError> {
    let student = super::db::students::try_get(pool, reg_number)
        .await?
        .ok_or_else(|| {
            PortalError::InvalidCredentials(
                "Invalid registration number. Please check and try again.".to_string(),
            )
        })?;
    let session = open_session(pool, SessionKind::Student, &student.reg_number).await?;
    Ok((student, session))
}

pub async fn open_session(
    pool: &Pool<Sqlite>,
    kind: SessionKind,
    principal: &str,
) -> Result<PortalSession, PortalError> {
    let session = sqlx::query_as(
        r"INSERT INTO portal_sessions (token, kind, principal, created_at)
          VALUES (?1, ?2, ?3, ?4) RETURNING *",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(kind.as_str())
    .bind(principal)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(session)
}

pub async fn close_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), PortalError> {
    sqlx::query(r"DELETE FROM portal_sessions WHERE token = ?1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolves a student session token to its student. A missing or stale
/// token, or one whose student has since been deleted, gates the route.
pub async fn student_for_session(
    pool: &Pool<Sqlite>,
    token: Option<&str>,
) -> Result<Student, PortalError> {
    let principal = session_principal(pool, token, SessionKind::Student)
        .await?
        .ok_or(PortalError::StudentSessionRequired)?;
    super::db::students::try_get(pool, &principal)
        .await?
        .ok_or(PortalError::StudentSessionRequired)
}

pub async fn admin_for_session(
    pool: &Pool<Sqlite>,
    token: Option<&str>,
) -> Result<AdminUser, PortalError> {
    let principal = session_principal(pool, token, SessionKind::Admin)
        .await?
        .ok_or(PortalError::AdminSessionRequired)?;
    let admin: Option<AdminUser> = sqlx::query_as(r"SELECT * FROM admin_users WHERE id = ?1")
        .bind(principal.parse::<i64>().unwrap_or(-1))
        .fetch_optional(pool)
        .await?;
    admin.ok_or(PortalError::AdminSessionRequired)
}

async fn session_principal(
    pool: &Pool<Sqlite>,
    token: Option<&str>,
    kind: SessionKind,
) -> Result<Option<String>, PortalError> {
    let Some(token) = token else {
        return Ok(None);
    };
    let principal = sqlx::query_scalar(
        r"SELECT principal FROM portal_sessions WHERE token = ?1 AND kind = ?2",
    )
    .bind(token)
    .bind(kind.as_str())
    .fetch_optional(pool)
    .await?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::super::db::students::{self, NewStudent};
    use super::super::db::testing::test_pool;
    use super::super::domain::Level;
    use super::*;

    async fn register_student(pool: &Pool<Sqlite>, reg: &str) {
        students::register(
            pool,
            NewStudent {
                reg_number: reg.to_string(),
                full_name: "Ada Obi".to_string(),
                email: None,
                phone: None,
                level: Level::L100,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn admin_login_checks_password() {
        let (_dir, pool) = test_pool().await;
        create_admin(&pool, "registrar", "s3cret").await.unwrap();

        let (admin, session) = admin_login(&pool, "registrar", "s3cret").await.unwrap();
        assert_eq!(admin.username, "registrar");
        let gated = admin_for_session(&pool, Some(&session.token)).await.unwrap();
        assert_eq!(gated.id, admin.id);

        assert!(matches!(
            admin_login(&pool, "registrar", "wrong").await.unwrap_err(),
            PortalError::InvalidCredentials(_)
        ));
        assert!(matches!(
            admin_login(&pool, "nobody", "s3cret").await.unwrap_err(),
            PortalError::InvalidCredentials(_)
        ));
    }

    #[tokio::test]
    async fn student_login_needs_only_an_existing_reg_number() {
        let (_dir, pool) = test_pool().await;
        register_student(&pool, "2020/1/12345").await;

        let (student, session) = student_login(&pool, "2020/1/12345").await.unwrap();
        assert_eq!(student.reg_number, "2020/1/12345");
        let gated = student_for_session(&pool, Some(&session.token)).await.unwrap();
        assert_eq!(gated.reg_number, "2020/1/12345");

        // Unknown number: invalid credentials, and no session row appears.
        assert!(matches!(
            student_login(&pool, "2020/1/99999").await.unwrap_err(),
            PortalError::InvalidCredentials(_)
        ));
        let sessions: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM portal_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(sessions, 1);
    }

    #[tokio::test]
    async fn sessions_do_not_cross_kinds() {
        let (_dir, pool) = test_pool().await;
        register_student(&pool, "2020/1/12345").await;
        create_admin(&pool, "registrar", "s3cret").await.unwrap();

        let (_, student_session) = student_login(&pool, "2020/1/12345").await.unwrap();
        assert!(matches!(
            admin_for_session(&pool, Some(&student_session.token)).await.unwrap_err(),
            PortalError::AdminSessionRequired
        ));
        assert!(matches!(
            student_for_session(&pool, None).await.unwrap_err(),
            PortalError::StudentSessionRequired
        ));
    }

    #[tokio::test]
    async fn closed_sessions_stop_working() {
        let (_dir, pool) = test_pool().await;
        register_student(&pool, "2020/1/12345").await;
        let (_, session) = student_login(&pool, "2020/1/12345").await.unwrap();
        close_session(&pool, &session.token).await.unwrap();
        assert!(matches!(
            student_for_session(&pool, Some(&session.token)).await.unwrap_err(),
            PortalError::StudentSessionRequired
        ));
    }

    #[tokio::test]
    async fn bootstrap_seeds_only_an_empty_table() {
        let (_dir, pool) = test_pool().await;
        bootstrap_admin(&pool, Some("registrar"), Some("s3cret")).await.unwrap();
        bootstrap_admin(&pool, Some("other"), Some("pw")).await.unwrap();
        let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM admin_users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        // No env credentials: nothing happens.
        bootstrap_admin(&pool, None, None).await.unwrap();
    }
}
