//! Back-office endpoints. Every route past login resolves the admin
//! session first; content writes record the acting admin as the
//! uploader so the audit trail survives account turnover.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use crate::api::auth::{self, ADMIN_SESSION_COOKIE};
use crate::api::db::calendar::{self, CalendarInput};
use crate::api::db::content::{
    self, AnnouncementInput, ExcoInput, HandbookInput, LibraryResourceInput, PastQuestionInput,
    StaffInput, TimetableInput,
};
use crate::api::db::dues::{self, DuesStats, DuesUpdate, NewDues};
use crate::api::db::table::{
    AcademicCalendar, AdminUser, Announcement, DepartmentalDues, DuesListRow, Exco,
    HandbookEntry, LibraryResource, PastQuestion, Staff, Testimonial, Timetable,
};
use crate::api::err::PortalError;
use crate::api::routes::{opt, parse_field, session_token};
use crate::api::AppState;

async fn current_admin(state: &AppState, jar: &CookieJar) -> Result<AdminUser, PortalError> {
    let token = session_token(jar, ADMIN_SESSION_COOKIE);
    auth::admin_for_session(&state.db, token.as_deref()).await
}

// ------------------------------------------------------------------ auth

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<AdminUser>), PortalError> {
    let (admin, session) = auth::admin_login(&state.db, form.username.trim(), &form.password).await?;
    log::info!("admin {} logged in", admin.username);
    let cookie = Cookie::build((ADMIN_SESSION_COOKIE, session.token))
        .path("/")
        .http_only(true)
        .build();
    Ok((jar.add(cookie), Json(admin)))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), PortalError> {
    if let Some(token) = session_token(&jar, ADMIN_SESSION_COOKIE) {
        auth::close_session(&state.db, &token).await?;
    }
    let jar = jar.remove(Cookie::build((ADMIN_SESSION_COOKIE, "")).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<content::DashboardStats>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::dashboard_stats(&state.db).await?))
}

// ----------------------------------------------------------- admin users

#[derive(Deserialize)]
pub struct AdminUserForm {
    pub username: String,
    pub password: String,
}

pub async fn add_admin_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AdminUserForm>,
) -> Result<(StatusCode, Json<AdminUser>), PortalError> {
    current_admin(&state, &jar).await?;
    let created = auth::create_admin(&state.db, &form.username, &form.password).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Uploads made by the removed admin survive with their uploader
/// reference cleared.
pub async fn delete_admin_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    let acting = current_admin(&state, &jar).await?;
    if acting.id == id {
        return Err(PortalError::Rejected(
            "You cannot delete the account you are logged in with.".to_string(),
        ));
    }
    auth::delete_admin(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------- staff

#[derive(Deserialize)]
pub struct StaffForm {
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub display_order: Option<i64>,
}

impl StaffForm {
    fn into_input(self) -> StaffInput {
        StaffInput {
            name: self.name,
            position: self.position,
            bio: self.bio,
            email: opt(self.email),
            phone: opt(self.phone),
            image: opt(self.image),
            display_order: self.display_order.unwrap_or(0),
        }
    }
}

pub async fn list_staff(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<Staff>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_staff(&state.db).await?))
}

pub async fn add_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<StaffForm>,
) -> Result<(StatusCode, Json<Staff>), PortalError> {
    current_admin(&state, &jar).await?;
    let staff = content::create_staff(&state.db, form.into_input()).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn edit_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<StaffForm>,
) -> Result<Json<Staff>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::update_staff(&state.db, id, form.into_input()).await?))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_staff(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------- excos

#[derive(Deserialize)]
pub struct ExcoForm {
    pub name: String,
    pub position: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub session: String,
    pub display_order: Option<i64>,
}

impl ExcoForm {
    fn into_input(self) -> ExcoInput {
        ExcoInput {
            name: self.name,
            position: self.position,
            bio: self.bio,
            email: opt(self.email),
            phone: opt(self.phone),
            image: opt(self.image),
            session: self.session,
            display_order: self.display_order.unwrap_or(0),
        }
    }
}

pub async fn list_excos(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<Exco>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_excos(&state.db).await?))
}

pub async fn add_exco(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ExcoForm>,
) -> Result<(StatusCode, Json<Exco>), PortalError> {
    current_admin(&state, &jar).await?;
    let exco = content::create_exco(&state.db, form.into_input()).await?;
    Ok((StatusCode::CREATED, Json(exco)))
}

pub async fn edit_exco(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<ExcoForm>,
) -> Result<Json<Exco>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::update_exco(&state.db, id, form.into_input()).await?))
}

pub async fn delete_exco(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_exco(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------------------------------------- past questions

#[derive(Deserialize)]
pub struct PastQuestionForm {
    pub course_code: String,
    pub course_title: String,
    pub level: String,
    pub semester: String,
    pub year: i64,
    pub link: String,
    pub description: Option<String>,
}

impl PastQuestionForm {
    fn into_input(self) -> Result<PastQuestionInput, PortalError> {
        Ok(PastQuestionInput {
            course_code: self.course_code,
            course_title: self.course_title,
            level: parse_field("level", &self.level)?,
            semester: parse_field("semester", &self.semester)?,
            year: self.year,
            link: self.link,
            description: opt(self.description),
        })
    }
}

pub async fn list_past_questions(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<PastQuestion>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::list_past_questions(&state.db, &Default::default()).await?,
    ))
}

pub async fn add_past_question(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<PastQuestionForm>,
) -> Result<(StatusCode, Json<PastQuestion>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let question =
        content::create_past_question(&state.db, form.into_input()?, admin.id).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn edit_past_question(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<PastQuestionForm>,
) -> Result<Json<PastQuestion>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::update_past_question(&state.db, id, form.into_input()?).await?,
    ))
}

pub async fn delete_past_question(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_past_question(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------ library resources

#[derive(Deserialize)]
pub struct LibraryResourceForm {
    pub title: String,
    pub author: Option<String>,
    pub category: String,
    pub description: String,
    pub link: String,
    pub cover_image: Option<String>,
    pub level: Option<String>,
}

impl LibraryResourceForm {
    fn into_input(self) -> Result<LibraryResourceInput, PortalError> {
        Ok(LibraryResourceInput {
            title: self.title,
            author: opt(self.author),
            category: parse_field("category", &self.category)?,
            description: self.description,
            link: self.link,
            cover_image: opt(self.cover_image),
            level: opt(self.level),
        })
    }
}

pub async fn list_library(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<LibraryResource>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::list_library(&state.db, &Default::default()).await?,
    ))
}

pub async fn add_library_resource(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LibraryResourceForm>,
) -> Result<(StatusCode, Json<LibraryResource>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let resource =
        content::create_library_resource(&state.db, form.into_input()?, admin.id).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn edit_library_resource(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<LibraryResourceForm>,
) -> Result<Json<LibraryResource>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::update_library_resource(&state.db, id, form.into_input()?).await?,
    ))
}

pub async fn delete_library_resource(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_library_resource(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------- testimonials

pub async fn list_testimonials(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<Testimonial>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_testimonials(&state.db).await?))
}

pub async fn approve_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::set_testimonial_approval(&state.db, &[id], true).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unapprove_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::set_testimonial_approval(&state.db, &[id], false).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_testimonial(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Batch approve/unapprove by explicit id set and target state.
#[derive(Deserialize)]
pub struct ApprovalBatch {
    pub ids: Vec<i64>,
    pub approved: bool,
}

#[derive(Serialize)]
pub struct BatchOutcome {
    pub affected: u64,
}

pub async fn batch_testimonial_approval(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(batch): Json<ApprovalBatch>,
) -> Result<Json<BatchOutcome>, PortalError> {
    current_admin(&state, &jar).await?;
    let affected =
        content::set_testimonial_approval(&state.db, &batch.ids, batch.approved).await?;
    Ok(Json(BatchOutcome { affected }))
}

// ---------------------------------------------------------- announcements

#[derive(Deserialize)]
pub struct AnnouncementForm {
    pub title: String,
    pub content: String,
    pub is_active: Option<bool>,
}

impl AnnouncementForm {
    fn into_input(self) -> AnnouncementInput {
        AnnouncementInput {
            title: self.title,
            content: self.content,
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

pub async fn list_announcements(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<Announcement>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_announcements(&state.db).await?))
}

pub async fn add_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AnnouncementForm>,
) -> Result<(StatusCode, Json<Announcement>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let announcement =
        content::create_announcement(&state.db, form.into_input(), admin.id).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn edit_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<AnnouncementForm>,
) -> Result<Json<Announcement>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::update_announcement(&state.db, id, form.into_input()).await?,
    ))
}

pub async fn delete_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_announcement(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------------------ dues

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesPage {
    pub dues: Vec<DuesListRow>,
    pub stats: DuesStats,
}

pub async fn list_dues(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<DuesPage>, PortalError> {
    current_admin(&state, &jar).await?;
    let (dues, stats) = dues::list(&state.db).await?;
    Ok(Json(DuesPage { dues, stats }))
}

#[derive(Deserialize)]
pub struct DuesForm {
    pub student_reg: String,
    pub amount_paid: Option<f64>,
    pub academic_session: String,
    pub is_approved: Option<bool>,
}

pub async fn add_dues(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DuesForm>,
) -> Result<(StatusCode, Json<DepartmentalDues>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let dues = dues::create(
        &state.db,
        NewDues {
            student_reg: form.student_reg.trim().to_string(),
            amount_paid: form.amount_paid.unwrap_or(5000.0),
            academic_session: form.academic_session,
            approve: form.is_approved.unwrap_or(false),
        },
        admin.id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(dues)))
}

pub async fn edit_dues(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<DuesForm>,
) -> Result<Json<DepartmentalDues>, PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let dues = dues::update(
        &state.db,
        id,
        DuesUpdate {
            amount_paid: form.amount_paid.unwrap_or(5000.0),
            academic_session: form.academic_session,
            is_approved: form.is_approved.unwrap_or(false),
        },
        admin.id,
    )
    .await?;
    Ok(Json(dues))
}

pub async fn approve_dues(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<Json<DepartmentalDues>, PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let dues = dues::approve(&state.db, id, admin.id).await?;
    log::info!("dues {} approved by {}", dues.receipt_number, admin.username);
    Ok(Json(dues))
}

pub async fn delete_dues(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    dues::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_dues_approval(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(batch): Json<ApprovalBatch>,
) -> Result<Json<BatchOutcome>, PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let affected =
        dues::set_approval(&state.db, &batch.ids, batch.approved, admin.id).await?;
    Ok(Json(BatchOutcome { affected }))
}

// -------------------------------------------------------- course handbook

#[derive(Deserialize)]
pub struct HandbookForm {
    pub level: String,
    pub semester: String,
    pub course_code: String,
    pub course_title: String,
    pub credit_unit: i64,
    pub course_type: Option<String>,
    pub description: Option<String>,
}

impl HandbookForm {
    fn into_input(self) -> Result<HandbookInput, PortalError> {
        let course_type = match opt(self.course_type) {
            Some(raw) => parse_field("course_type", &raw)?,
            None => crate::api::domain::CourseType::Core,
        };
        Ok(HandbookInput {
            level: parse_field("level", &self.level)?,
            semester: parse_field("semester", &self.semester)?,
            course_code: self.course_code,
            course_title: self.course_title,
            credit_unit: self.credit_unit,
            course_type,
            description: opt(self.description),
        })
    }
}

pub async fn list_handbook(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<HandbookEntry>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_handbook(&state.db).await?))
}

pub async fn add_handbook_entry(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<HandbookForm>,
) -> Result<(StatusCode, Json<HandbookEntry>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let entry = content::create_handbook_entry(&state.db, form.into_input()?, admin.id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn edit_handbook_entry(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<HandbookForm>,
) -> Result<Json<HandbookEntry>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::update_handbook_entry(&state.db, id, form.into_input()?).await?,
    ))
}

pub async fn delete_handbook_entry(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_handbook_entry(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------------- timetables

#[derive(Deserialize)]
pub struct TimetableForm {
    pub title: String,
    pub timetable_type: String,
    pub level: Option<String>,
    pub semester: String,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl TimetableForm {
    fn into_input(self) -> Result<TimetableInput, PortalError> {
        let level = match opt(self.level) {
            Some(raw) => parse_field("level", &raw)?,
            None => crate::api::domain::TimetableLevel::All,
        };
        Ok(TimetableInput {
            title: self.title,
            timetable_type: parse_field("timetable_type", &self.timetable_type)?,
            level,
            semester: parse_field("semester", &self.semester)?,
            academic_session: self.academic_session,
            image: self.image,
            description: opt(self.description),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

pub async fn list_timetables(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<Timetable>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(content::list_timetables(&state.db).await?))
}

pub async fn add_timetable(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<TimetableForm>,
) -> Result<(StatusCode, Json<Timetable>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let timetable = content::create_timetable(&state.db, form.into_input()?, admin.id).await?;
    Ok((StatusCode::CREATED, Json(timetable)))
}

pub async fn edit_timetable(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<TimetableForm>,
) -> Result<Json<Timetable>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(
        content::update_timetable(&state.db, id, form.into_input()?).await?,
    ))
}

pub async fn delete_timetable(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    content::delete_timetable(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------ academic calendar

#[derive(Deserialize)]
pub struct CalendarForm {
    pub title: String,
    pub academic_session: String,
    pub image: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl CalendarForm {
    fn into_input(self) -> CalendarInput {
        CalendarInput {
            title: self.title,
            academic_session: self.academic_session,
            image: self.image,
            description: opt(self.description),
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

pub async fn list_calendars(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<AcademicCalendar>>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(calendar::list(&state.db).await?))
}

pub async fn add_calendar(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CalendarForm>,
) -> Result<(StatusCode, Json<AcademicCalendar>), PortalError> {
    let admin = current_admin(&state, &jar).await?;
    let created = calendar::create(&state.db, form.into_input(), admin.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn edit_calendar(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<CalendarForm>,
) -> Result<Json<AcademicCalendar>, PortalError> {
    current_admin(&state, &jar).await?;
    Ok(Json(calendar::update(&state.db, id, form.into_input()).await?))
}

pub async fn delete_calendar(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    current_admin(&state, &jar).await?;
    calendar::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
