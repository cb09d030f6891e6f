//! Semesters and courses of the CGPA calculator, plus snapshot history.
//!
//! Every operation is scoped to the owning student; a record id that
//! belongs to somebody else behaves exactly like a missing one.

use serde::Serialize;
use sqlx::{Pool, Sqlite};

use super::super::domain::Grade;
use super::super::err::PortalError;
use super::super::gpa::{self, CourseLoad};
use super::{now, table::{CgpaCalculation, Course, Semester}};

pub struct SemesterInput {
    pub name: String,
    pub year: Option<String>,
}

pub struct CourseInput {
    pub course_code: String,
    pub course_name: String,
    pub credit_unit: i64,
    pub grade_point: f64,
}

/// One semester of the live result breakdown.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SemesterResult {
    pub id: i64,
    pub name: String,
    pub gpa: f64,
    pub credits: i64,
    pub courses: Vec<CourseResult>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CourseResult {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: i64,
    pub grade: &'static str,
    pub grade_point: f64,
}

/// Live weighted totals over a student's current rows. Recomputed on
/// demand; snapshots in `cgpa_calculations` are written separately.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub semesters: Vec<SemesterResult>,
    pub cgpa: f64,
    pub total_credits: i64,
    pub total_points: f64,
}

fn validate_course(input: &CourseInput) -> Result<(), PortalError> {
    if input.course_code.trim().is_empty() {
        return Err(PortalError::invalid("course_code", "course code is required"));
    }
    if input.credit_unit <= 0 {
        return Err(PortalError::invalid(
            "credit_unit",
            "credit unit must be a positive integer",
        ));
    }
    if Grade::from_points(input.grade_point).is_none() {
        return Err(PortalError::invalid(
            "grade_point",
            "grade point must be one of 5.0, 4.0, 3.0, 2.0, 1.0, 0.0",
        ));
    }
    Ok(())
}

pub async fn add_semester(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    input: SemesterInput,
) -> Result<Semester, PortalError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(PortalError::invalid("name", "semester name is required"));
    }
    let duplicate: Option<i64> =
        sqlx::query_scalar(r"SELECT id FROM semesters WHERE student_reg = ?1 AND name = ?2")
            .bind(student_reg)
            .bind(&name)
            .fetch_optional(pool)
            .await?;
    if duplicate.is_some() {
        return Err(PortalError::invalid(
            "name",
            "you already have a semester with this name",
        ));
    }

    let id: i64 = sqlx::query_scalar(
        r"INSERT INTO semesters (student_reg, name, year, created_at)
          VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(student_reg)
    .bind(&name)
    .bind(&input.year)
    .bind(now())
    .fetch_one(pool)
    .await?;
    get_semester(pool, student_reg, id).await
}

pub async fn get_semester(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
) -> Result<Semester, PortalError> {
    sqlx::query_as(r"SELECT * FROM semesters WHERE id = ?1 AND student_reg = ?2")
        .bind(id)
        .bind(student_reg)
        .fetch_optional(pool)
        .await?
        .ok_or(PortalError::NotFound)
}

pub async fn update_semester(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
    input: SemesterInput,
) -> Result<Semester, PortalError> {
    let current = get_semester(pool, student_reg, id).await?;
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(PortalError::invalid("name", "semester name is required"));
    }
    if name != current.name {
        let duplicate: Option<i64> =
            sqlx::query_scalar(r"SELECT id FROM semesters WHERE student_reg = ?1 AND name = ?2")
                .bind(student_reg)
                .bind(&name)
                .fetch_optional(pool)
                .await?;
        if duplicate.is_some() {
            return Err(PortalError::invalid(
                "name",
                "you already have a semester with this name",
            ));
        }
    }
    sqlx::query(r"UPDATE semesters SET name = ?1, year = ?2 WHERE id = ?3")
        .bind(&name)
        .bind(&input.year)
        .bind(id)
        .execute(pool)
        .await?;
    get_semester(pool, student_reg, id).await
}

/// Deleting a semester drops its courses with it.
pub async fn delete_semester(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
) -> Result<(), PortalError> {
    let result = sqlx::query(r"DELETE FROM semesters WHERE id = ?1 AND student_reg = ?2")
        .bind(id)
        .bind(student_reg)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PortalError::NotFound);
    }
    Ok(())
}

pub async fn add_course(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    semester_id: i64,
    input: CourseInput,
) -> Result<Course, PortalError> {
    validate_course(&input)?;
    // Ownership check doubles as existence check.
    get_semester(pool, student_reg, semester_id).await?;

    let id: i64 = sqlx::query_scalar(
        r"INSERT INTO courses (semester_id, course_code, course_name, credit_unit, grade_point, created_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(semester_id)
    .bind(input.course_code.trim())
    .bind(input.course_name.trim())
    .bind(input.credit_unit)
    .bind(input.grade_point)
    .bind(now())
    .fetch_one(pool)
    .await?;
    get_course(pool, student_reg, id).await
}

pub async fn get_course(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
) -> Result<Course, PortalError> {
    sqlx::query_as(
        r"SELECT c.* FROM courses c
          JOIN semesters s ON s.id = c.semester_id
          WHERE c.id = ?1 AND s.student_reg = ?2",
    )
    .bind(id)
    .bind(student_reg)
    .fetch_optional(pool)
    .await?
    .ok_or(PortalError::NotFound)
}

pub async fn update_course(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
    input: CourseInput,
) -> Result<Course, PortalError> {
    validate_course(&input)?;
    get_course(pool, student_reg, id).await?;
    sqlx::query(
        r"UPDATE courses
          SET course_code = ?1, course_name = ?2, credit_unit = ?3, grade_point = ?4
          WHERE id = ?5",
    )
    .bind(input.course_code.trim())
    .bind(input.course_name.trim())
    .bind(input.credit_unit)
    .bind(input.grade_point)
    .bind(id)
    .execute(pool)
    .await?;
    get_course(pool, student_reg, id).await
}

pub async fn delete_course(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    id: i64,
) -> Result<(), PortalError> {
    get_course(pool, student_reg, id).await?;
    sqlx::query(r"DELETE FROM courses WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn semesters_of(
    pool: &Pool<Sqlite>,
    student_reg: &str,
) -> Result<Vec<Semester>, PortalError> {
    let semesters =
        sqlx::query_as(r"SELECT * FROM semesters WHERE student_reg = ?1 ORDER BY created_at, id")
            .bind(student_reg)
            .fetch_all(pool)
            .await?;
    Ok(semesters)
}

pub async fn courses_of(
    pool: &Pool<Sqlite>,
    semester_id: i64,
) -> Result<Vec<Course>, PortalError> {
    let courses =
        sqlx::query_as(r"SELECT * FROM courses WHERE semester_id = ?1 ORDER BY course_code")
            .bind(semester_id)
            .fetch_all(pool)
            .await?;
    Ok(courses)
}

/// Recomputes the live breakdown from current rows. Grouping into
/// semesters never changes the cumulative figure.
pub async fn transcript(
    pool: &Pool<Sqlite>,
    student_reg: &str,
) -> Result<Transcript, PortalError> {
    let mut semesters = Vec::new();
    let mut total_credits = 0i64;
    let mut total_points = 0f64;

    for semester in semesters_of(pool, student_reg).await? {
        let courses = courses_of(pool, semester.id).await?;
        let loads: Vec<CourseLoad> = courses
            .iter()
            .map(|c| CourseLoad {
                credit_unit: c.credit_unit,
                grade_point: c.grade_point,
            })
            .collect();
        let (credits, points) = gpa::totals(&loads);
        total_credits += credits;
        total_points += points;

        semesters.push(SemesterResult {
            id: semester.id,
            name: semester.name,
            gpa: gpa::gpa(&loads),
            credits,
            courses: courses
                .into_iter()
                .map(|c| CourseResult {
                    id: c.id,
                    code: c.course_code,
                    name: c.course_name,
                    credits: c.credit_unit,
                    grade: Grade::letter_for(c.grade_point),
                    grade_point: c.grade_point,
                })
                .collect(),
        });
    }

    Ok(Transcript {
        cgpa: gpa::cgpa(total_credits, total_points),
        total_credits,
        total_points,
        semesters,
    })
}

/// Runs the cumulative calculation and appends one snapshot row. Never
/// idempotent: each call records a new entry even with unchanged inputs.
pub async fn record_cgpa(
    pool: &Pool<Sqlite>,
    student_reg: &str,
) -> Result<(CgpaCalculation, Transcript), PortalError> {
    let transcript = transcript(pool, student_reg).await?;
    let snapshot = sqlx::query_as(
        r"INSERT INTO cgpa_calculations
          (student_reg, cgpa, total_credit_units, total_grade_points, calculated_at)
          VALUES (?1, ?2, ?3, ?4, ?5) RETURNING *",
    )
    .bind(student_reg)
    .bind(transcript.cgpa)
    .bind(transcript.total_credits)
    .bind(transcript.total_points)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok((snapshot, transcript))
}

pub async fn cgpa_history(
    pool: &Pool<Sqlite>,
    student_reg: &str,
    limit: i64,
) -> Result<Vec<CgpaCalculation>, PortalError> {
    let history = sqlx::query_as(
        r"SELECT * FROM cgpa_calculations WHERE student_reg = ?1
          ORDER BY calculated_at DESC, id DESC LIMIT ?2",
    )
    .bind(student_reg)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(history)
}

pub async fn latest_cgpa(
    pool: &Pool<Sqlite>,
    student_reg: &str,
) -> Result<Option<CgpaCalculation>, PortalError> {
    Ok(cgpa_history(pool, student_reg, 1).await?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::super::students::{self, NewStudent};
    use super::super::testing::test_pool;
    use super::*;
    use crate::api::domain::Level;

    async fn student(pool: &sqlx::Pool<Sqlite>, reg: &str) {
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

    fn course(code: &str, credit: i64, grade: f64) -> CourseInput {
        CourseInput {
            course_code: code.to_string(),
            course_name: format!("{code} title"),
            credit_unit: credit,
            grade_point: grade,
        }
    }

    #[tokio::test]
    async fn semester_names_unique_per_student() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        student(&pool, "s2").await;

        add_semester(&pool, "s1", SemesterInput { name: "100L First".into(), year: None })
            .await
            .unwrap();
        let err = add_semester(&pool, "s1", SemesterInput { name: "100L First".into(), year: None })
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        // Another student may reuse the name.
        add_semester(&pool, "s2", SemesterInput { name: "100L First".into(), year: None })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn foreign_records_read_as_missing() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        student(&pool, "s2").await;
        let semester =
            add_semester(&pool, "s1", SemesterInput { name: "100L First".into(), year: None })
                .await
                .unwrap();
        let owned = add_course(&pool, "s1", semester.id, course("BME101", 3, 5.0))
            .await
            .unwrap();

        assert!(matches!(
            get_semester(&pool, "s2", semester.id).await.unwrap_err(),
            PortalError::NotFound
        ));
        assert!(matches!(
            delete_course(&pool, "s2", owned.id).await.unwrap_err(),
            PortalError::NotFound
        ));
    }

    #[tokio::test]
    async fn course_validation() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        let semester =
            add_semester(&pool, "s1", SemesterInput { name: "100L First".into(), year: None })
                .await
                .unwrap();

        let err = add_course(&pool, "s1", semester.id, course("BME101", 0, 5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "credit_unit"));

        let err = add_course(&pool, "s1", semester.id, course("BME101", 3, 4.5))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "grade_point"));
    }

    #[tokio::test]
    async fn transcript_matches_ungrouped_average() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        let a = add_semester(&pool, "s1", SemesterInput { name: "A".into(), year: None })
            .await
            .unwrap();
        let b = add_semester(&pool, "s1", SemesterInput { name: "B".into(), year: None })
            .await
            .unwrap();
        add_course(&pool, "s1", a.id, course("BME101", 3, 5.0)).await.unwrap();
        add_course(&pool, "s1", b.id, course("BME201", 2, 3.0)).await.unwrap();

        let transcript = transcript(&pool, "s1").await.unwrap();
        assert_eq!(transcript.total_credits, 5);
        assert_eq!(transcript.total_points, 21.0);
        assert_eq!(transcript.cgpa, 4.20);
        assert_eq!(transcript.semesters[0].gpa, 5.0);
        assert_eq!(transcript.semesters[1].gpa, 3.0);
        assert_eq!(transcript.semesters[0].courses[0].grade, "A");
    }

    #[tokio::test]
    async fn each_calculation_appends_one_snapshot() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        let semester = add_semester(&pool, "s1", SemesterInput { name: "A".into(), year: None })
            .await
            .unwrap();
        add_course(&pool, "s1", semester.id, course("BME101", 3, 5.0)).await.unwrap();

        let (first, _) = record_cgpa(&pool, "s1").await.unwrap();
        let (second, _) = record_cgpa(&pool, "s1").await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.cgpa, second.cgpa);

        let history = cgpa_history(&pool, "s1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        // Newest first.
        assert_eq!(history[0].id, second.id);
        assert_eq!(latest_cgpa(&pool, "s1").await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn empty_transcript_is_zero() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        let transcript = transcript(&pool, "s1").await.unwrap();
        assert_eq!(transcript.cgpa, 0.0);
        assert_eq!(transcript.total_credits, 0);

        let (snapshot, _) = record_cgpa(&pool, "s1").await.unwrap();
        assert_eq!(snapshot.cgpa, 0.0);
    }

    #[tokio::test]
    async fn deleting_student_cascades() {
        let (_dir, pool) = test_pool().await;
        student(&pool, "s1").await;
        let semester = add_semester(&pool, "s1", SemesterInput { name: "A".into(), year: None })
            .await
            .unwrap();
        add_course(&pool, "s1", semester.id, course("BME101", 3, 5.0)).await.unwrap();
        record_cgpa(&pool, "s1").await.unwrap();

        students::delete(&pool, "s1").await.unwrap();

        let semesters: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM semesters")
            .fetch_one(&pool)
            .await
            .unwrap();
        let courses: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM courses")
            .fetch_one(&pool)
            .await
            .unwrap();
        let snapshots: i64 = sqlx::query_scalar(r"SELECT COUNT(*) FROM cgpa_calculations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((semesters, courses, snapshots), (0, 0, 0));
    }
}
