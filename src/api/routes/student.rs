//! Student-portal endpoints. Registration and login issue the session
//! cookie; every other route resolves it first and treats a missing or
//! stale session as a redirect to the login page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use crate::api::auth::{self, STUDENT_SESSION_COOKIE};
use crate::api::db::content;
use crate::api::db::dues;
use crate::api::db::results::{self, CourseInput, SemesterInput, Transcript};
use crate::api::db::students::{self, NewStudent, ProfileUpdate};
use crate::api::db::table::{
    Announcement, CgpaCalculation, Course, DepartmentalDues, Semester, Student,
};
use crate::api::err::PortalError;
use crate::api::routes::{opt, parse_field, session_token};
use crate::api::AppState;

async fn current_student(state: &AppState, jar: &CookieJar) -> Result<Student, PortalError> {
    let token = session_token(jar, STUDENT_SESSION_COOKIE);
    auth::student_for_session(&state.db, token.as_deref()).await
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((STUDENT_SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

// ------------------------------------------------------------------ auth

#[derive(Deserialize)]
pub struct RegisterForm {
    pub reg_number: String,
    pub confirm_reg_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub level: String,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, (StatusCode, Json<Student>)), PortalError> {
    if form.reg_number.trim() != form.confirm_reg_number.trim() {
        return Err(PortalError::invalid(
            "confirm_reg_number",
            "Registration numbers do not match",
        ));
    }
    let student = students::register(
        &state.db,
        NewStudent {
            reg_number: form.reg_number,
            full_name: form.full_name,
            email: opt(form.email),
            phone: None,
            level: parse_field("level", &form.level)?,
        },
    )
    .await?;
    let session =
        auth::open_session(&state.db, auth::SessionKind::Student, &student.reg_number).await?;
    log::info!("registered student {}", student.reg_number);
    Ok((
        jar.add(session_cookie(session.token)),
        (StatusCode::CREATED, Json(student)),
    ))
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub reg_number: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<Student>), PortalError> {
    let (student, session) = auth::student_login(&state.db, form.reg_number.trim()).await?;
    Ok((jar.add(session_cookie(session.token)), Json(student)))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), PortalError> {
    if let Some(token) = session_token(&jar, STUDENT_SESSION_COOKIE) {
        auth::close_session(&state.db, &token).await?;
    }
    let jar = jar.remove(Cookie::build((STUDENT_SESSION_COOKIE, "")).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

// ------------------------------------------------------------- dashboard

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub student: Student,
    pub transcript: Transcript,
    pub latest_cgpa: Option<CgpaCalculation>,
    pub announcements: Vec<Announcement>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<DashboardPayload>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let transcript = results::transcript(&state.db, &student.reg_number).await?;
    let latest_cgpa = results::latest_cgpa(&state.db, &student.reg_number).await?;
    let announcements = content::active_announcements(&state.db, 3).await?;
    Ok(Json(DashboardPayload {
        student,
        transcript,
        latest_cgpa,
        announcements,
    }))
}

// --------------------------------------------------------------- profile

pub async fn profile(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Student>, PortalError> {
    Ok(Json(current_student(&state, &jar).await?))
}

#[derive(Deserialize)]
pub struct ProfileForm {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub level: String,
    pub profile_image: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<Json<Student>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let updated = students::update_profile(
        &state.db,
        &student.reg_number,
        ProfileUpdate {
            full_name: form.full_name,
            email: opt(form.email),
            phone: opt(form.phone),
            level: parse_field("level", &form.level)?,
            profile_image: opt(form.profile_image),
        },
    )
    .await?;
    Ok(Json(updated))
}

pub async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), PortalError> {
    let student = current_student(&state, &jar).await?;
    students::delete(&state.db, &student.reg_number).await?;
    if let Some(token) = session_token(&jar, STUDENT_SESSION_COOKIE) {
        auth::close_session(&state.db, &token).await?;
    }
    log::info!("deleted student account {}", student.reg_number);
    let jar = jar.remove(Cookie::build((STUDENT_SESSION_COOKIE, "")).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

// ------------------------------------------------------- cgpa calculator

pub async fn cgpa_calculator(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Transcript>, PortalError> {
    let student = current_student(&state, &jar).await?;
    Ok(Json(results::transcript(&state.db, &student.reg_number).await?))
}

#[derive(Deserialize)]
pub struct SemesterForm {
    pub name: String,
    pub year: Option<String>,
}

pub async fn add_semester(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SemesterForm>,
) -> Result<(StatusCode, Json<Semester>), PortalError> {
    let student = current_student(&state, &jar).await?;
    let semester = results::add_semester(
        &state.db,
        &student.reg_number,
        SemesterInput {
            name: form.name,
            year: opt(form.year),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(semester)))
}

pub async fn edit_semester(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<SemesterForm>,
) -> Result<Json<Semester>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let semester = results::update_semester(
        &state.db,
        &student.reg_number,
        id,
        SemesterInput {
            name: form.name,
            year: opt(form.year),
        },
    )
    .await?;
    Ok(Json(semester))
}

pub async fn delete_semester(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    let student = current_student(&state, &jar).await?;
    results::delete_semester(&state.db, &student.reg_number, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CourseForm {
    pub course_code: String,
    pub course_name: String,
    pub credit_unit: i64,
    pub grade_point: f64,
}

impl CourseForm {
    fn into_input(self) -> CourseInput {
        CourseInput {
            course_code: self.course_code,
            course_name: self.course_name,
            credit_unit: self.credit_unit,
            grade_point: self.grade_point,
        }
    }
}

pub async fn add_course(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(semester_id): Path<i64>,
    Form(form): Form<CourseForm>,
) -> Result<(StatusCode, Json<Course>), PortalError> {
    let student = current_student(&state, &jar).await?;
    let course = results::add_course(
        &state.db,
        &student.reg_number,
        semester_id,
        form.into_input(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn edit_course(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<CourseForm>,
) -> Result<Json<Course>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let course =
        results::update_course(&state.db, &student.reg_number, id, form.into_input()).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<StatusCode, PortalError> {
    let student = current_student(&state, &jar).await?;
    results::delete_course(&state.db, &student.reg_number, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationPayload {
    pub snapshot: CgpaCalculation,
    pub transcript: Transcript,
}

/// Runs the cumulative calculation and appends a history row; calling it
/// again with nothing changed appends another.
pub async fn calculate_cgpa(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<CalculationPayload>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let (snapshot, transcript) = results::record_cgpa(&state.db, &student.reg_number).await?;
    Ok(Json(CalculationPayload {
        snapshot,
        transcript,
    }))
}

pub async fn cgpa_history(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<CgpaCalculation>>, PortalError> {
    let student = current_student(&state, &jar).await?;
    Ok(Json(
        results::cgpa_history(&state.db, &student.reg_number, 10).await?,
    ))
}

// ---------------------------------------------------------------- dues

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub student: Student,
    pub dues: Option<DepartmentalDues>,
}

pub async fn my_receipt(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ReceiptPayload>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let dues = dues::for_student(&state.db, &student.reg_number).await?;
    Ok(Json(ReceiptPayload { student, dues }))
}

/// The printable receipt exists only once the dues are approved.
pub async fn print_receipt(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<ReceiptPayload>, PortalError> {
    let student = current_student(&state, &jar).await?;
    let dues = dues::for_student(&state.db, &student.reg_number).await?;
    match dues {
        Some(d) if d.is_approved => Ok(Json(ReceiptPayload {
            student,
            dues: Some(d),
        })),
        _ => Err(PortalError::Rejected(
            "Your departmental dues have not been approved yet.".to_string(),
        )),
    }
}
