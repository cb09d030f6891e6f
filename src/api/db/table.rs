//! Row types, one per table, shared by the query layer and the JSON
//! responses.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub reg_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level: String,
    pub profile_image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: i64,
    pub student_reg: String,
    pub name: String,
    pub year: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub semester_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub credit_unit: i64,
    pub grade_point: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Immutable snapshot written by the CGPA calculator.
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CgpaCalculation {
    pub id: i64,
    pub student_reg: String,
    pub cgpa: f64,
    pub total_credit_units: i64,
    pub total_grade_points: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub calculated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentalDues {
    pub id: i64,
    pub student_reg: String,
    pub amount_paid: f64,
    pub payment_reference: String,
    pub receipt_number: String,
    pub watermark_code: String,
    pub is_approved: bool,
    pub approved_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    pub academic_session: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Dues row joined with the owning student, for the admin list view.
#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DuesListRow {
    pub id: i64,
    pub student_reg: String,
    pub student_name: String,
    pub amount_paid: f64,
    pub payment_reference: String,
    pub receipt_number: String,
    pub is_approved: bool,
    pub approved_by: Option<i64>,
    pub academic_session: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub display_order: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Exco {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub session: String,
    pub display_order: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PastQuestion {
    pub id: i64,
    pub course_code: String,
    pub course_title: String,
    pub level: String,
    pub semester: String,
    pub year: i64,
    pub link: String,
    pub description: Option<String>,
    pub uploaded_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LibraryResource {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub category: String,
    pub description: String,
    pub link: String,
    pub cover_image: Option<String>,
    pub level: Option<String>,
    pub uploaded_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub rating: i64,
    pub is_approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub created_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HandbookEntry {
    pub id: i64,
    pub level: String,
    pub semester: String,
    pub course_code: String,
    pub course_title: String,
    pub credit_unit: i64,
    pub course_type: String,
    pub description: Option<String>,
    pub uploaded_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: i64,
    pub title: String,
    pub timetable_type: String,
    pub level: String,
    pub semester: String,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub uploaded_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AcademicCalendar {
    pub id: i64,
    pub title: String,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub uploaded_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortalSession {
    pub token: String,
    pub kind: String,
    pub principal: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
