//! CRUD over the plain content records: staff, excos, past questions,
//! library resources, testimonials, announcements, the course handbook
//! and timetables. No derived computation lives here; list endpoints
//! filter by exact match only.

use serde::Serialize;
use sqlx::{Pool, Sqlite};

use super::super::domain::{CourseType, Level, ResourceCategory, SemesterPeriod, TimetableKind, TimetableLevel};
use super::super::err::PortalError;
use super::{now, table::{
    Announcement, Exco, HandbookEntry, LibraryResource, PastQuestion, Staff, Testimonial,
    Timetable,
}};

fn required(field: &'static str, value: &str) -> Result<(), PortalError> {
    if value.trim().is_empty() {
        return Err(PortalError::invalid(field, format!("{field} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------- staff

pub struct StaffInput {
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub display_order: i64,
}

pub async fn list_staff(pool: &Pool<Sqlite>) -> Result<Vec<Staff>, PortalError> {
    let staff = sqlx::query_as(r"SELECT * FROM staff ORDER BY display_order, name")
        .fetch_all(pool)
        .await?;
    Ok(staff)
}

pub async fn create_staff(pool: &Pool<Sqlite>, input: StaffInput) -> Result<Staff, PortalError> {
    required("name", &input.name)?;
    required("position", &input.position)?;
    required("bio", &input.bio)?;
    let staff = sqlx::query_as(
        r"INSERT INTO staff (name, position, bio, email, phone, image, display_order, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.position.trim())
    .bind(input.bio.trim())
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.image)
    .bind(input.display_order)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(staff)
}

pub async fn update_staff(
    pool: &Pool<Sqlite>,
    id: i64,
    input: StaffInput,
) -> Result<Staff, PortalError> {
    required("name", &input.name)?;
    required("position", &input.position)?;
    required("bio", &input.bio)?;
    let staff = sqlx::query_as(
        r"UPDATE staff
          SET name = ?1, position = ?2, bio = ?3, email = ?4, phone = ?5, image = ?6,
              display_order = ?7, updated_at = ?8
          WHERE id = ?9 RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.position.trim())
    .bind(input.bio.trim())
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.image)
    .bind(input.display_order)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    staff.ok_or(PortalError::NotFound)
}

pub async fn delete_staff(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "staff", id).await
}

// ---------------------------------------------------------------- excos

pub struct ExcoInput {
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub session: String,
    pub display_order: i64,
}

pub async fn list_excos(pool: &Pool<Sqlite>) -> Result<Vec<Exco>, PortalError> {
    let excos = sqlx::query_as(r"SELECT * FROM excos ORDER BY display_order, name")
        .fetch_all(pool)
        .await?;
    Ok(excos)
}

pub async fn create_exco(pool: &Pool<Sqlite>, input: ExcoInput) -> Result<Exco, PortalError> {
    required("name", &input.name)?;
    required("position", &input.position)?;
    required("session", &input.session)?;
    let exco = sqlx::query_as(
        r"INSERT INTO excos
          (name, position, bio, email, phone, image, session, display_order, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.position.trim())
    .bind(input.bio.trim())
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.image)
    .bind(input.session.trim())
    .bind(input.display_order)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(exco)
}

pub async fn update_exco(
    pool: &Pool<Sqlite>,
    id: i64,
    input: ExcoInput,
) -> Result<Exco, PortalError> {
    required("name", &input.name)?;
    required("position", &input.position)?;
    required("session", &input.session)?;
    let exco = sqlx::query_as(
        r"UPDATE excos
          SET name = ?1, position = ?2, bio = ?3, email = ?4, phone = ?5, image = ?6,
              session = ?7, display_order = ?8, updated_at = ?9
          WHERE id = ?10 RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.position.trim())
    .bind(input.bio.trim())
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.image)
    .bind(input.session.trim())
    .bind(input.display_order)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    exco.ok_or(PortalError::NotFound)
}

pub async fn delete_exco(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "excos", id).await
}

// -------------------------------------------------------- past questions

pub struct PastQuestionInput {
    pub course_code: String,
    pub course_title: String,
    pub level: Level,
    pub semester: SemesterPeriod,
    pub year: i64,
    pub link: String,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct PastQuestionFilter {
    pub level: Option<String>,
    pub semester: Option<String>,
    pub year: Option<i64>,
}

pub async fn list_past_questions(
    pool: &Pool<Sqlite>,
    filter: &PastQuestionFilter,
) -> Result<Vec<PastQuestion>, PortalError> {
    let questions = sqlx::query_as(
        r"SELECT * FROM past_questions
          WHERE (?1 IS NULL OR level = ?1)
            AND (?2 IS NULL OR semester = ?2)
            AND (?3 IS NULL OR year = ?3)
          ORDER BY year DESC, level, course_code",
    )
    .bind(&filter.level)
    .bind(&filter.semester)
    .bind(filter.year)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

/// Distinct years present, newest first, for the filter control.
pub async fn past_question_years(pool: &Pool<Sqlite>) -> Result<Vec<i64>, PortalError> {
    let years = sqlx::query_scalar(r"SELECT DISTINCT year FROM past_questions ORDER BY year DESC")
        .fetch_all(pool)
        .await?;
    Ok(years)
}

pub async fn create_past_question(
    pool: &Pool<Sqlite>,
    input: PastQuestionInput,
    uploaded_by: i64,
) -> Result<PastQuestion, PortalError> {
    required("course_code", &input.course_code)?;
    required("course_title", &input.course_title)?;
    required("link", &input.link)?;
    let question = sqlx::query_as(
        r"INSERT INTO past_questions
          (course_code, course_title, level, semester, year, link, description, uploaded_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) RETURNING *",
    )
    .bind(input.course_code.trim())
    .bind(input.course_title.trim())
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.year)
    .bind(input.link.trim())
    .bind(&input.description)
    .bind(uploaded_by)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(question)
}

pub async fn update_past_question(
    pool: &Pool<Sqlite>,
    id: i64,
    input: PastQuestionInput,
) -> Result<PastQuestion, PortalError> {
    required("course_code", &input.course_code)?;
    required("course_title", &input.course_title)?;
    required("link", &input.link)?;
    let question = sqlx::query_as(
        r"UPDATE past_questions
          SET course_code = ?1, course_title = ?2, level = ?3, semester = ?4, year = ?5,
              link = ?6, description = ?7, updated_at = ?8
          WHERE id = ?9 RETURNING *",
    )
    .bind(input.course_code.trim())
    .bind(input.course_title.trim())
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.year)
    .bind(input.link.trim())
    .bind(&input.description)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    question.ok_or(PortalError::NotFound)
}

pub async fn delete_past_question(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "past_questions", id).await
}

// ------------------------------------------------------ library resources

pub struct LibraryResourceInput {
    pub title: String,
    pub author: Option<String>,
    pub category: ResourceCategory,
    pub description: String,
    pub link: String,
    pub cover_image: Option<String>,
    pub level: Option<String>,
}

#[derive(Default)]
pub struct LibraryFilter {
    pub category: Option<String>,
    pub level: Option<String>,
}

pub async fn list_library(
    pool: &Pool<Sqlite>,
    filter: &LibraryFilter,
) -> Result<Vec<LibraryResource>, PortalError> {
    let resources = sqlx::query_as(
        r"SELECT * FROM library_resources
          WHERE (?1 IS NULL OR category = ?1)
            AND (?2 IS NULL OR level = ?2)
          ORDER BY created_at DESC, id DESC",
    )
    .bind(&filter.category)
    .bind(&filter.level)
    .fetch_all(pool)
    .await?;
    Ok(resources)
}

pub async fn create_library_resource(
    pool: &Pool<Sqlite>,
    input: LibraryResourceInput,
    uploaded_by: i64,
) -> Result<LibraryResource, PortalError> {
    required("title", &input.title)?;
    required("description", &input.description)?;
    required("link", &input.link)?;
    let resource = sqlx::query_as(
        r"INSERT INTO library_resources
          (title, author, category, description, link, cover_image, level, uploaded_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) RETURNING *",
    )
    .bind(input.title.trim())
    .bind(&input.author)
    .bind(input.category.as_str())
    .bind(input.description.trim())
    .bind(input.link.trim())
    .bind(&input.cover_image)
    .bind(&input.level)
    .bind(uploaded_by)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(resource)
}

pub async fn update_library_resource(
    pool: &Pool<Sqlite>,
    id: i64,
    input: LibraryResourceInput,
) -> Result<LibraryResource, PortalError> {
    required("title", &input.title)?;
    required("description", &input.description)?;
    required("link", &input.link)?;
    let resource = sqlx::query_as(
        r"UPDATE library_resources
          SET title = ?1, author = ?2, category = ?3, description = ?4, link = ?5,
              cover_image = ?6, level = ?7, updated_at = ?8
          WHERE id = ?9 RETURNING *",
    )
    .bind(input.title.trim())
    .bind(&input.author)
    .bind(input.category.as_str())
    .bind(input.description.trim())
    .bind(input.link.trim())
    .bind(&input.cover_image)
    .bind(&input.level)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    resource.ok_or(PortalError::NotFound)
}

pub async fn delete_library_resource(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "library_resources", id).await
}

// ----------------------------------------------------------- testimonials

pub struct TestimonialInput {
    pub name: String,
    pub message: String,
    pub rating: i64,
}

/// Public submissions land unapproved and stay off the site until an
/// admin flips them.
pub async fn submit_testimonial(
    pool: &Pool<Sqlite>,
    input: TestimonialInput,
) -> Result<Testimonial, PortalError> {
    required("name", &input.name)?;
    required("message", &input.message)?;
    if !(1..=5).contains(&input.rating) {
        return Err(PortalError::invalid("rating", "rating must be between 1 and 5"));
    }
    let testimonial = sqlx::query_as(
        r"INSERT INTO testimonials (name, message, rating, is_approved, created_at, updated_at)
          VALUES (?1, ?2, ?3, 0, ?4, ?4) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.message.trim())
    .bind(input.rating)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(testimonial)
}

pub async fn list_testimonials(pool: &Pool<Sqlite>) -> Result<Vec<Testimonial>, PortalError> {
    let testimonials =
        sqlx::query_as(r"SELECT * FROM testimonials ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await?;
    Ok(testimonials)
}

pub async fn approved_testimonials(
    pool: &Pool<Sqlite>,
    limit: i64,
) -> Result<Vec<Testimonial>, PortalError> {
    let testimonials = sqlx::query_as(
        r"SELECT * FROM testimonials WHERE is_approved = 1
          ORDER BY created_at DESC, id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(testimonials)
}

/// Batch approval flip over a set of testimonial ids.
pub async fn set_testimonial_approval(
    pool: &Pool<Sqlite>,
    ids: &[i64],
    approved: bool,
) -> Result<u64, PortalError> {
    let mut affected = 0u64;
    let ts = now();
    let mut tx = pool.begin().await?;
    for id in ids {
        let result = sqlx::query(
            r"UPDATE testimonials SET is_approved = ?1, updated_at = ?2
              WHERE id = ?3 AND is_approved != ?1",
        )
        .bind(approved)
        .bind(ts)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        affected += result.rows_affected();
    }
    tx.commit().await?;
    Ok(affected)
}

pub async fn delete_testimonial(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "testimonials", id).await
}

// ---------------------------------------------------------- announcements

pub struct AnnouncementInput {
    pub title: String,
    pub content: String,
    pub is_active: bool,
}

pub async fn active_announcements(
    pool: &Pool<Sqlite>,
    limit: i64,
) -> Result<Vec<Announcement>, PortalError> {
    let announcements = sqlx::query_as(
        r"SELECT * FROM announcements WHERE is_active = 1
          ORDER BY created_at DESC, id DESC LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(announcements)
}

pub async fn list_announcements(pool: &Pool<Sqlite>) -> Result<Vec<Announcement>, PortalError> {
    let announcements =
        sqlx::query_as(r"SELECT * FROM announcements ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await?;
    Ok(announcements)
}

pub async fn create_announcement(
    pool: &Pool<Sqlite>,
    input: AnnouncementInput,
    created_by: i64,
) -> Result<Announcement, PortalError> {
    required("title", &input.title)?;
    required("content", &input.content)?;
    let announcement = sqlx::query_as(
        r"INSERT INTO announcements (title, content, is_active, created_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.content.trim())
    .bind(input.is_active)
    .bind(created_by)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(announcement)
}

pub async fn update_announcement(
    pool: &Pool<Sqlite>,
    id: i64,
    input: AnnouncementInput,
) -> Result<Announcement, PortalError> {
    required("title", &input.title)?;
    required("content", &input.content)?;
    let announcement = sqlx::query_as(
        r"UPDATE announcements SET title = ?1, content = ?2, is_active = ?3, updated_at = ?4
          WHERE id = ?5 RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.content.trim())
    .bind(input.is_active)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    announcement.ok_or(PortalError::NotFound)
}

pub async fn delete_announcement(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "announcements", id).await
}

// -------------------------------------------------------- course handbook

pub struct HandbookInput {
    pub level: Level,
    pub semester: SemesterPeriod,
    pub course_code: String,
    pub course_title: String,
    pub credit_unit: i64,
    pub course_type: CourseType,
    pub description: Option<String>,
}

/// Handbook rows for one level/semester page, plus their credit total.
pub async fn handbook_section(
    pool: &Pool<Sqlite>,
    level: &str,
    semester: &str,
) -> Result<(Vec<HandbookEntry>, i64), PortalError> {
    let entries: Vec<HandbookEntry> = sqlx::query_as(
        r"SELECT * FROM course_handbook WHERE level = ?1 AND semester = ?2 ORDER BY course_code",
    )
    .bind(level)
    .bind(semester)
    .fetch_all(pool)
    .await?;
    let total_credits = entries.iter().map(|e| e.credit_unit).sum();
    Ok((entries, total_credits))
}

pub async fn list_handbook(pool: &Pool<Sqlite>) -> Result<Vec<HandbookEntry>, PortalError> {
    let entries =
        sqlx::query_as(r"SELECT * FROM course_handbook ORDER BY level, semester, course_code")
            .fetch_all(pool)
            .await?;
    Ok(entries)
}

pub async fn create_handbook_entry(
    pool: &Pool<Sqlite>,
    input: HandbookInput,
    uploaded_by: i64,
) -> Result<HandbookEntry, PortalError> {
    required("course_code", &input.course_code)?;
    required("course_title", &input.course_title)?;
    if input.credit_unit <= 0 {
        return Err(PortalError::invalid(
            "credit_unit",
            "credit unit must be a positive integer",
        ));
    }
    let duplicate: Option<i64> = sqlx::query_scalar(
        r"SELECT id FROM course_handbook WHERE level = ?1 AND semester = ?2 AND course_code = ?3",
    )
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.course_code.trim())
    .fetch_optional(pool)
    .await?;
    if duplicate.is_some() {
        return Err(PortalError::invalid(
            "course_code",
            "this course is already in the handbook for that level and semester",
        ));
    }
    let entry = sqlx::query_as(
        r"INSERT INTO course_handbook
          (level, semester, course_code, course_title, credit_unit, course_type, description, uploaded_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) RETURNING *",
    )
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.course_code.trim())
    .bind(input.course_title.trim())
    .bind(input.credit_unit)
    .bind(input.course_type.as_str())
    .bind(&input.description)
    .bind(uploaded_by)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

pub async fn update_handbook_entry(
    pool: &Pool<Sqlite>,
    id: i64,
    input: HandbookInput,
) -> Result<HandbookEntry, PortalError> {
    required("course_code", &input.course_code)?;
    required("course_title", &input.course_title)?;
    if input.credit_unit <= 0 {
        return Err(PortalError::invalid(
            "credit_unit",
            "credit unit must be a positive integer",
        ));
    }
    let duplicate: Option<i64> = sqlx::query_scalar(
        r"SELECT id FROM course_handbook
          WHERE level = ?1 AND semester = ?2 AND course_code = ?3 AND id != ?4",
    )
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.course_code.trim())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    if duplicate.is_some() {
        return Err(PortalError::invalid(
            "course_code",
            "this course is already in the handbook for that level and semester",
        ));
    }
    let entry = sqlx::query_as(
        r"UPDATE course_handbook
          SET level = ?1, semester = ?2, course_code = ?3, course_title = ?4,
              credit_unit = ?5, course_type = ?6, description = ?7, updated_at = ?8
          WHERE id = ?9 RETURNING *",
    )
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.course_code.trim())
    .bind(input.course_title.trim())
    .bind(input.credit_unit)
    .bind(input.course_type.as_str())
    .bind(&input.description)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    entry.ok_or(PortalError::NotFound)
}

pub async fn delete_handbook_entry(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "course_handbook", id).await
}

// ------------------------------------------------------------- timetables

pub struct TimetableInput {
    pub title: String,
    pub timetable_type: TimetableKind,
    pub level: TimetableLevel,
    pub semester: SemesterPeriod,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Active timetables of one kind. A concrete level also matches rows
/// published for all levels; no level shows everything of that kind.
pub async fn published_timetables(
    pool: &Pool<Sqlite>,
    kind: &str,
    level: Option<&str>,
) -> Result<Vec<Timetable>, PortalError> {
    let timetables = sqlx::query_as(
        r"SELECT * FROM timetables
          WHERE is_active = 1 AND timetable_type = ?1
            AND (?2 IS NULL OR level = ?2 OR level = 'All')
          ORDER BY created_at DESC, id DESC",
    )
    .bind(kind)
    .bind(level)
    .fetch_all(pool)
    .await?;
    Ok(timetables)
}

pub async fn list_timetables(pool: &Pool<Sqlite>) -> Result<Vec<Timetable>, PortalError> {
    let timetables = sqlx::query_as(r"SELECT * FROM timetables ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?;
    Ok(timetables)
}

pub async fn create_timetable(
    pool: &Pool<Sqlite>,
    input: TimetableInput,
    uploaded_by: i64,
) -> Result<Timetable, PortalError> {
    required("title", &input.title)?;
    required("academic_session", &input.academic_session)?;
    required("image", &input.image)?;
    let timetable = sqlx::query_as(
        r"INSERT INTO timetables
          (title, timetable_type, level, semester, academic_session, image, description, is_active, uploaded_by, created_at, updated_at)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10) RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.timetable_type.as_str())
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.academic_session.trim())
    .bind(input.image.trim())
    .bind(&input.description)
    .bind(input.is_active)
    .bind(uploaded_by)
    .bind(now())
    .fetch_one(pool)
    .await?;
    Ok(timetable)
}

pub async fn update_timetable(
    pool: &Pool<Sqlite>,
    id: i64,
    input: TimetableInput,
) -> Result<Timetable, PortalError> {
    required("title", &input.title)?;
    required("academic_session", &input.academic_session)?;
    required("image", &input.image)?;
    let timetable = sqlx::query_as(
        r"UPDATE timetables
          SET title = ?1, timetable_type = ?2, level = ?3, semester = ?4,
              academic_session = ?5, image = ?6, description = ?7, is_active = ?8, updated_at = ?9
          WHERE id = ?10 RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.timetable_type.as_str())
    .bind(input.level.as_str())
    .bind(input.semester.as_str())
    .bind(input.academic_session.trim())
    .bind(input.image.trim())
    .bind(&input.description)
    .bind(input.is_active)
    .bind(now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    timetable.ok_or(PortalError::NotFound)
}

pub async fn delete_timetable(pool: &Pool<Sqlite>, id: i64) -> Result<(), PortalError> {
    delete_row(pool, "timetables", id).await
}

// -------------------------------------------------------------- summaries

/// Counts shown on the admin dashboard.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub staff_count: i64,
    pub excos_count: i64,
    pub past_questions_count: i64,
    pub library_count: i64,
    pub testimonials_pending: i64,
    pub announcements_active: i64,
}

pub async fn dashboard_stats(pool: &Pool<Sqlite>) -> Result<DashboardStats, PortalError> {
    Ok(DashboardStats {
        staff_count: count(pool, r"SELECT COUNT(*) FROM staff").await?,
        excos_count: count(pool, r"SELECT COUNT(*) FROM excos").await?,
        past_questions_count: count(pool, r"SELECT COUNT(*) FROM past_questions").await?,
        library_count: count(pool, r"SELECT COUNT(*) FROM library_resources").await?,
        testimonials_pending: count(
            pool,
            r"SELECT COUNT(*) FROM testimonials WHERE is_approved = 0",
        )
        .await?,
        announcements_active: count(
            pool,
            r"SELECT COUNT(*) FROM announcements WHERE is_active = 1",
        )
        .await?,
    })
}

async fn count(pool: &Pool<Sqlite>, sql: &str) -> Result<i64, PortalError> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}

async fn delete_row(pool: &Pool<Sqlite>, table: &str, id: i64) -> Result<(), PortalError> {
    // Table names come from the callers above, never from input.
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
        .bind(id)
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
    use crate::api::auth;

    async fn admin(pool: &Pool<Sqlite>) -> i64 {
        auth::create_admin(pool, "registrar", "pw").await.unwrap().id
    }

    fn question(code: &str, level: Level, semester: SemesterPeriod, year: i64) -> PastQuestionInput {
        PastQuestionInput {
            course_code: code.to_string(),
            course_title: format!("{code} paper"),
            level,
            semester,
            year,
            link: "https://drive.example.com/q".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn past_question_filters_are_exact_match() {
        let (_dir, pool) = test_pool().await;
        let uploader = admin(&pool).await;
        create_past_question(&pool, question("BME301", Level::L300, SemesterPeriod::First, 2022), uploader)
            .await
            .unwrap();
        create_past_question(&pool, question("BME302", Level::L300, SemesterPeriod::Second, 2023), uploader)
            .await
            .unwrap();
        create_past_question(&pool, question("BME401", Level::L400, SemesterPeriod::First, 2023), uploader)
            .await
            .unwrap();

        let all = list_past_questions(&pool, &PastQuestionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest year first.
        assert_eq!(all[0].year, 2023);

        let filtered = list_past_questions(
            &pool,
            &PastQuestionFilter {
                level: Some("300".to_string()),
                semester: None,
                year: Some(2023),
            },
        )
        .await
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].course_code, "BME302");

        assert_eq!(past_question_years(&pool).await.unwrap(), vec![2023, 2022]);
    }

    #[tokio::test]
    async fn deleting_the_uploader_keeps_the_upload() {
        let (_dir, pool) = test_pool().await;
        let uploader = admin(&pool).await;
        let resource = create_library_resource(
            &pool,
            LibraryResourceInput {
                title: "Biomechanics".to_string(),
                author: Some("J. Doe".to_string()),
                category: ResourceCategory::Textbook,
                description: "Intro text".to_string(),
                link: "https://library.example.com/biomech".to_string(),
                cover_image: None,
                level: Some("300".to_string()),
            },
            uploader,
        )
        .await
        .unwrap();
        assert_eq!(resource.uploaded_by, Some(uploader));

        auth::delete_admin(&pool, uploader).await.unwrap();

        let survivors = list_library(&pool, &LibraryFilter::default()).await.unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].uploaded_by, None);
        assert_eq!(survivors[0].title, "Biomechanics");
    }

    #[tokio::test]
    async fn testimonial_lifecycle() {
        let (_dir, pool) = test_pool().await;
        let first = submit_testimonial(
            &pool,
            TestimonialInput {
                name: "Chidi".to_string(),
                message: "Great department".to_string(),
                rating: 5,
            },
        )
        .await
        .unwrap();
        let second = submit_testimonial(
            &pool,
            TestimonialInput {
                name: "Ngozi".to_string(),
                message: "Helpful lecturers".to_string(),
                rating: 4,
            },
        )
        .await
        .unwrap();
        assert!(!first.is_approved);
        assert!(approved_testimonials(&pool, 6).await.unwrap().is_empty());

        let affected = set_testimonial_approval(&pool, &[first.id, second.id], true)
            .await
            .unwrap();
        assert_eq!(affected, 2);
        assert_eq!(approved_testimonials(&pool, 6).await.unwrap().len(), 2);

        // Flipping one back down.
        assert_eq!(
            set_testimonial_approval(&pool, &[first.id], false).await.unwrap(),
            1
        );
        assert_eq!(approved_testimonials(&pool, 6).await.unwrap().len(), 1);

        let err = submit_testimonial(
            &pool,
            TestimonialInput {
                name: "Obi".to_string(),
                message: "ok".to_string(),
                rating: 6,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "rating"));
    }

    #[tokio::test]
    async fn handbook_rejects_duplicate_course_per_section() {
        let (_dir, pool) = test_pool().await;
        let uploader = admin(&pool).await;
        let input = HandbookInput {
            level: Level::L100,
            semester: SemesterPeriod::First,
            course_code: "BME101".to_string(),
            course_title: "Introduction to BME".to_string(),
            credit_unit: 3,
            course_type: CourseType::Core,
            description: None,
        };
        create_handbook_entry(
            &pool,
            HandbookInput { course_code: "BME101".to_string(), ..copy(&input) },
            uploader,
        )
        .await
        .unwrap();
        let err = create_handbook_entry(&pool, copy(&input), uploader).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let (entries, total) = handbook_section(&pool, "100", "First").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(total, 3);
    }

    fn copy(input: &HandbookInput) -> HandbookInput {
        HandbookInput {
            level: input.level,
            semester: input.semester,
            course_code: input.course_code.clone(),
            course_title: input.course_title.clone(),
            credit_unit: input.credit_unit,
            course_type: input.course_type,
            description: input.description.clone(),
        }
    }

    #[tokio::test]
    async fn timetable_level_filter_includes_all_levels() {
        let (_dir, pool) = test_pool().await;
        let uploader = admin(&pool).await;
        let base = TimetableInput {
            title: "Exam timetable".to_string(),
            timetable_type: TimetableKind::Exam,
            level: TimetableLevel::All,
            semester: SemesterPeriod::First,
            academic_session: "2023/2024".to_string(),
            image: "https://img.example.com/tt.png".to_string(),
            description: None,
            is_active: true,
        };
        create_timetable(&pool, TimetableInput { ..base_copy(&base) }, uploader)
            .await
            .unwrap();
        create_timetable(
            &pool,
            TimetableInput {
                title: "300L exams".to_string(),
                level: TimetableLevel::Only(Level::L300),
                ..base_copy(&base)
            },
            uploader,
        )
        .await
        .unwrap();
        create_timetable(
            &pool,
            TimetableInput {
                title: "Hidden".to_string(),
                is_active: false,
                ..base_copy(&base)
            },
            uploader,
        )
        .await
        .unwrap();

        let for_300 = published_timetables(&pool, "Exam", Some("300")).await.unwrap();
        assert_eq!(for_300.len(), 2);

        let for_100 = published_timetables(&pool, "Exam", Some("100")).await.unwrap();
        assert_eq!(for_100.len(), 1);
        assert_eq!(for_100[0].level, "All");

        let everything = published_timetables(&pool, "Exam", None).await.unwrap();
        assert_eq!(everything.len(), 2);
        assert!(published_timetables(&pool, "Class", None).await.unwrap().is_empty());
    }

    fn base_copy(input: &TimetableInput) -> TimetableInput {
        TimetableInput {
            title: input.title.clone(),
            timetable_type: input.timetable_type,
            level: input.level,
            semester: input.semester,
            academic_session: input.academic_session.clone(),
            image: input.image.clone(),
            description: input.description.clone(),
            is_active: input.is_active,
        }
    }

    #[tokio::test]
    async fn dashboard_counts() {
        let (_dir, pool) = test_pool().await;
        let uploader = admin(&pool).await;
        create_staff(
            &pool,
            StaffInput {
                name: "Prof. Eze".to_string(),
                position: "HOD".to_string(),
                bio: "Professor of biomechanics".to_string(),
                email: None,
                phone: None,
                image: None,
                display_order: 0,
            },
        )
        .await
        .unwrap();
        submit_testimonial(
            &pool,
            TestimonialInput {
                name: "Chidi".to_string(),
                message: "Great".to_string(),
                rating: 5,
            },
        )
        .await
        .unwrap();
        create_announcement(
            &pool,
            AnnouncementInput {
                title: "Resumption".to_string(),
                content: "School resumes Monday".to_string(),
                is_active: true,
            },
            uploader,
        )
        .await
        .unwrap();

        let stats = dashboard_stats(&pool).await.unwrap();
        assert_eq!(stats.staff_count, 1);
        assert_eq!(stats.testimonials_pending, 1);
        assert_eq!(stats.announcements_active, 1);
        assert_eq!(stats.excos_count, 0);
    }
}
