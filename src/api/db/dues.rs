//! Departmental dues and receipt issuance.
//!
//! Receipt number, watermark code and payment reference are assigned once,
//! inside the insert transaction, and no update path touches them again.
//! The per-year sequence comes from `receipt_counters`, bumped with a
//! single upsert so concurrent same-year writers serialize on the row.

use serde::Serialize;
use sqlx::{Pool, Sqlite};
use time::OffsetDateTime;

use super::super::err::PortalError;
use super::super::receipt::{self, VerificationCode};
use super::{now, table::{DepartmentalDues, DuesListRow}};

pub struct NewDues {
    pub student_reg: String,
    pub amount_paid: f64,
    pub academic_session: String,
    pub approve: bool,
}

pub struct DuesUpdate {
    pub amount_paid: f64,
    pub academic_session: String,
    pub is_approved: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DuesStats {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
}

/// Outcome of an anti-fraud lookup by receipt number or watermark code.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub valid: bool,
    pub approved: bool,
    pub receipt_number: Option<String>,
    pub academic_session: Option<String>,
}

pub async fn create(
    pool: &Pool<Sqlite>,
    new: NewDues,
    acting_admin: i64,
) -> Result<DepartmentalDues, PortalError> {
    create_dated(pool, new, acting_admin, now()).await
}

/// Split out so tests can pin the calendar year.
async fn create_dated(
    pool: &Pool<Sqlite>,
    new: NewDues,
    acting_admin: i64,
    at: OffsetDateTime,
) -> Result<DepartmentalDues, PortalError> {
    if new.academic_session.trim().is_empty() {
        return Err(PortalError::invalid(
            "academic_session",
            "academic session is required",
        ));
    }
    if new.amount_paid < 0.0 {
        return Err(PortalError::invalid("amount_paid", "amount cannot be negative"));
    }
    let exists: Option<i64> = sqlx::query_scalar(r"SELECT 1 FROM students WHERE reg_number = ?1")
        .bind(&new.student_reg)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(PortalError::invalid(
            "student",
            "unknown registration number",
        ));
    }
    let duplicate: Option<i64> =
        sqlx::query_scalar(r"SELECT id FROM departmental_dues WHERE student_reg = ?1")
            .bind(&new.student_reg)
            .fetch_optional(pool)
            .await?;
    if duplicate.is_some() {
        return Err(PortalError::invalid(
            "student",
            "this student already has a dues record",
        ));
    }

    let mut tx = pool.begin().await?;
    let sequence = next_sequence(&mut tx, at.year()).await?;
    let receipt_number = receipt::receipt_number(at.year(), sequence);
    let watermark_code = receipt::watermark_code();
    let payment_reference = receipt::payment_reference();

    let (approved_by, approved_at) = if new.approve {
        (Some(acting_admin), Some(at))
    } else {
        (None, None)
    };

    let dues: DepartmentalDues = sqlx::query_as(
        r"INSERT INTO departmental_dues
          (student_reg, amount_paid, payment_reference, receipt_number, watermark_code,
           is_approved, approved_by, approved_at, academic_session, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
          RETURNING *",
    )
    .bind(&new.student_reg)
    .bind(new.amount_paid)
    .bind(&payment_reference)
    .bind(&receipt_number)
    .bind(&watermark_code)
    .bind(new.approve)
    .bind(approved_by)
    .bind(approved_at)
    .bind(new.academic_session.trim())
    .bind(at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    log::info!(
        "issued receipt {} for student {}",
        dues.receipt_number,
        dues.student_reg
    );
    Ok(dues)
}

/// Bumps and returns the counter for one calendar year. Runs inside the
/// caller's transaction so a failed insert rolls the bump back too.
async fn next_sequence(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    year: i32,
) -> Result<i64, PortalError> {
    let sequence = sqlx::query_scalar(
        r"INSERT INTO receipt_counters (year, last_seq) VALUES (?1, 1)
          ON CONFLICT (year) DO UPDATE SET last_seq = last_seq + 1
          RETURNING last_seq",
    )
    .bind(year)
    .fetch_one(&mut **tx)
    .await?;
    Ok(sequence)
}

pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<DepartmentalDues, PortalError> {
    sqlx::query_as(r"SELECT * FROM departmental_dues WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound)
}

pub async fn for_student(
    pool: &Pool<Sqlite>,
    student_reg: &str,
) -> Result<Option<DepartmentalDues>, PortalError> {
    let dues = sqlx::query_as(r"SELECT * FROM departmental_dues WHERE student_reg = ?1")
        .bind(student_reg)
        .fetch_optional(pool)
        .await?;
    Ok(dues)
}

/// Editable fields only; receipt number and companion codes stay as
/// issued. Approval state transitions stamp or clear the approver.
pub async fn update(
    pool: &Pool<Sqlite>,
    id: i64,
    update: DuesUpdate,
    acting_admin: i64,
) -> Result<DepartmentalDues, PortalError> {
    let current = get(pool, id).await?;
    let (approved_by, approved_at) = match (current.is_approved, update.is_approved) {
        (false, true) => (Some(acting_admin), Some(now())),
        (_, false) => (None, None),
        (true, true) => (current.approved_by, current.approved_at),
    };
    sqlx::query(
        r"UPDATE departmental_dues
          SET amount_paid = ?1, academic_session = ?2, is_approved = ?3,
              approved_by = ?4, approved_at = ?5, updated_at = ?6
          WHERE id = ?7",
    )
    .bind(update.amount_paid)
    .bind(update.academic_session.trim())
    .bind(update.is_approved)
    .bind(approved_by)
    .bind(approved_at)
    .bind(now())
    .bind(id)
    .execute(pool)
    .await?;
    get(pool, id).await
}

pub async fn approve(
    pool: &Pool<Sqlite>,
    id: i64,
    acting_admin: i64,
) -> Result<DepartmentalDues, PortalError> {
    let affected = set_approval(pool, &[id], true, acting_admin).await?;
    if affected == 0 {
        return Err(PortalError::NotFound);
    }
    get(pool, id).await
}

/// Batch approval flip for a set of dues ids. Approving stamps the acting
/// admin and timestamp together; unapproving clears both.
pub async fn set_approval(
    pool: &Pool<Sqlite>,
    ids: &[i64],
    approved: bool,
    acting_admin: i64,
) -> Result<u64, PortalError> {
    let mut affected = 0u64;
    let ts = now();
    let mut tx = pool.begin().await?;
    for id in ids {
        let result = if approved {
            sqlx::query(
                r"UPDATE departmental_dues
                  SET is_approved = 1, approved_by = ?1, approved_at = ?2, updated_at = ?2
                  WHERE id = ?3 AND is_approved = 0",
            )
            .bind(acting_admin)
            .bind(ts)
            .bind(id)
            .execute(&mut *tx)
            .await?
        } else {
            sqlx::query(
                r"UPDATE departmental_dues
                  SET is_approved = 0, approved_by = NULL, approved_at = NULL, updated_at = ?1
                  WHERE id = ?2 AND is_approved = 1",
            )
            .bind(ts)
            .bind(id)
            .execute(&mut *tx)
            .await?
        };
        affected += result.rows_affected();
    }
    tx.commit().await?;
    Ok(affected)
}

pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    let result = sqlx::query(r"DELETE FROM departmental_dues WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    Ok(())
}

pub async fn list(pool: &Pool<Sqlite>) -> Result<(Vec<DuesListRow>, DuesStats), PortalError> {
    let rows: Vec<DuesListRow> = sqlx::query_as(
        r"SELECT d.id, d.student_reg, s.full_name AS student_name, d.amount_paid,
                 d.payment_reference, d.receipt_number, d.is_approved, d.approved_by,
                 d.academic_session, d.created_at
          FROM departmental_dues d
          JOIN students s ON s.reg_number = d.student_reg
          ORDER BY d.created_at DESC, d.id DESC",
    )
    .fetch_all(pool)
    .await?;
    let approved = rows.iter().filter(|r| r.is_approved).count() as i64;
    let stats = DuesStats {
        total: rows.len() as i64,
        approved,
        pending: rows.len() as i64 - approved,
    };
    Ok((rows, stats))
}

/// Anti-fraud lookup. The code may be a receipt number or a watermark
/// code; a malformed code is a validation failure, an unknown one reads
/// as invalid rather than not-found.
pub async fn verify(pool: &Pool<Sqlite>, code: &str) -> Result<Verification, PortalError> {
    let parsed = receipt::parse_verification_code(code).ok_or_else(|| {
        PortalError::invalid("code", "enter a receipt number or watermark code")
    })?;
    let dues: Option<DepartmentalDues> = match parsed {
        VerificationCode::ReceiptNumber(n) => {
            sqlx::query_as(r"SELECT * FROM departmental_dues WHERE receipt_number = ?1")
                .bind(n)
                .fetch_optional(pool)
                .await?
        }
        VerificationCode::Watermark(w) => {
            sqlx::query_as(r"SELECT * FROM departmental_dues WHERE watermark_code = ?1")
                .bind(w)
                .fetch_optional(pool)
                .await?
        }
    };
    Ok(match dues {
        Some(d) => Verification {
            valid: true,
            approved: d.is_approved,
            receipt_number: Some(d.receipt_number),
            academic_session: Some(d.academic_session),
        },
        None => Verification {
            valid: false,
            approved: false,
            receipt_number: None,
            academic_session: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::super::students::{self, NewStudent};
    use super::super::testing::test_pool;
    use super::*;
    use crate::api::auth;
    use crate::api::domain::Level;
    use time::macros::datetime;

    async fn seed(pool: &Pool<Sqlite>, regs: &[&str]) -> i64 {
        for reg in regs {
            students::register(
                pool,
                NewStudent {
                    reg_number: reg.to_string(),
                    full_name: format!("Student {reg}"),
                    email: None,
                    phone: None,
                    level: Level::L100,
                },
            )
            .await
            .unwrap();
        }
        auth::create_admin(pool, "registrar", "secret").await.unwrap().id
    }

    fn dues_for(reg: &str) -> NewDues {
        NewDues {
            student_reg: reg.to_string(),
            amount_paid: 5000.0,
            academic_session: "2023/2024".to_string(),
            approve: false,
        }
    }

    #[tokio::test]
    async fn receipts_increment_within_a_year() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1", "s2", "s3"]).await;
        let at = datetime!(2024-05-10 12:00:00 UTC);

        let first = create_dated(&pool, dues_for("s1"), admin, at).await.unwrap();
        let second = create_dated(&pool, dues_for("s2"), admin, at).await.unwrap();
        let third = create_dated(&pool, dues_for("s3"), admin, at).await.unwrap();
        assert_eq!(first.receipt_number, "BME/2024/0001");
        assert_eq!(second.receipt_number, "BME/2024/0002");
        assert_eq!(third.receipt_number, "BME/2024/0003");
    }

    #[tokio::test]
    async fn sequence_restarts_each_year() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1", "s2"]).await;

        let old = create_dated(&pool, dues_for("s1"), admin, datetime!(2024-11-01 08:00:00 UTC))
            .await
            .unwrap();
        let new = create_dated(&pool, dues_for("s2"), admin, datetime!(2025-01-02 08:00:00 UTC))
            .await
            .unwrap();
        assert_eq!(old.receipt_number, "BME/2024/0001");
        assert_eq!(new.receipt_number, "BME/2025/0001");
    }

    #[tokio::test]
    async fn companion_codes_are_assigned_once() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1"]).await;
        let dues = create(&pool, dues_for("s1"), admin).await.unwrap();
        assert!(dues.watermark_code.starts_with("BME-"));
        assert!(dues.payment_reference.starts_with("PAY-"));

        let edited = update(
            &pool,
            dues.id,
            DuesUpdate {
                amount_paid: 7500.0,
                academic_session: "2024/2025".to_string(),
                is_approved: true,
            },
            admin,
        )
        .await
        .unwrap();
        assert_eq!(edited.receipt_number, dues.receipt_number);
        assert_eq!(edited.watermark_code, dues.watermark_code);
        assert_eq!(edited.payment_reference, dues.payment_reference);
        assert_eq!(edited.amount_paid, 7500.0);
    }

    #[tokio::test]
    async fn one_dues_record_per_student() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1"]).await;
        create(&pool, dues_for("s1"), admin).await.unwrap();
        let err = create(&pool, dues_for("s1"), admin).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));
    }

    #[tokio::test]
    async fn approval_stamps_and_clears_together() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1"]).await;
        let dues = create(&pool, dues_for("s1"), admin).await.unwrap();
        assert!(!dues.is_approved);
        assert_eq!(dues.approved_by, None);
        assert_eq!(dues.approved_at, None);

        let approved = approve(&pool, dues.id, admin).await.unwrap();
        assert!(approved.is_approved);
        assert_eq!(approved.approved_by, Some(admin));
        assert!(approved.approved_at.is_some());

        let reverted = update(
            &pool,
            dues.id,
            DuesUpdate {
                amount_paid: 5000.0,
                academic_session: "2023/2024".to_string(),
                is_approved: false,
            },
            admin,
        )
        .await
        .unwrap();
        assert!(!reverted.is_approved);
        assert_eq!(reverted.approved_by, None);
        assert_eq!(reverted.approved_at, None);
    }

    #[tokio::test]
    async fn batch_approval() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1", "s2", "s3"]).await;
        let a = create(&pool, dues_for("s1"), admin).await.unwrap();
        let b = create(&pool, dues_for("s2"), admin).await.unwrap();
        let c = create(&pool, dues_for("s3"), admin).await.unwrap();

        let affected = set_approval(&pool, &[a.id, b.id], true, admin).await.unwrap();
        assert_eq!(affected, 2);

        let (_, stats) = list(&pool).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.pending, 1);

        // Re-approving is a no-op; unapproving one flips it back.
        assert_eq!(set_approval(&pool, &[a.id], true, admin).await.unwrap(), 0);
        assert_eq!(
            set_approval(&pool, &[a.id, c.id], false, admin).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn verification_lookup() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1"]).await;
        let dues = create(&pool, dues_for("s1"), admin).await.unwrap();

        let by_receipt = verify(&pool, &dues.receipt_number).await.unwrap();
        assert!(by_receipt.valid);
        assert!(!by_receipt.approved);

        approve(&pool, dues.id, admin).await.unwrap();
        let by_watermark = verify(&pool, &dues.watermark_code).await.unwrap();
        assert!(by_watermark.valid);
        assert!(by_watermark.approved);
        assert_eq!(by_watermark.receipt_number.as_deref(), Some(dues.receipt_number.as_str()));

        let unknown = verify(&pool, "BME/2024/9999").await.unwrap();
        assert!(!unknown.valid);

        assert!(matches!(
            verify(&pool, "not-a-code").await.unwrap_err(),
            PortalError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn deleting_student_removes_dues() {
        let (_dir, pool) = test_pool().await;
        let admin = seed(&pool, &["s1"]).await;
        create(&pool, dues_for("s1"), admin).await.unwrap();
        students::delete(&pool, "s1").await.unwrap();
        assert!(for_student(&pool, "s1").await.unwrap().is_none());
        let count: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM departmental_dues")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
