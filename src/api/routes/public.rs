//! Public endpoints: the informational pages and the anti-fraud receipt
//! check. Everything here is readable without a session; the only write
//! is the testimonial submission, which lands unapproved.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::db::content::{
    self, LibraryFilter, PastQuestionFilter, TestimonialInput,
};
use crate::api::db::table::{
    AcademicCalendar, Announcement, Exco, HandbookEntry, LibraryResource, PastQuestion, Staff,
    Testimonial, Timetable,
};
use crate::api::db::{calendar, dues};
use crate::api::err::PortalError;
use crate::api::routes::opt;
use crate::api::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub total_staff: i64,
    pub total_resources: i64,
    pub total_questions: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePayload {
    pub testimonials: Vec<Testimonial>,
    pub announcements: Vec<Announcement>,
    pub recent_staff: Vec<Staff>,
    pub current_excos: Vec<Exco>,
    pub recent_resources: Vec<LibraryResource>,
    pub recent_questions: Vec<PastQuestion>,
    pub stats: HomeStats,
}

pub async fn home(State(state): State<AppState>) -> Result<Json<HomePayload>, PortalError> {
    let staff = content::list_staff(&state.db).await?;
    let excos = content::list_excos(&state.db).await?;
    let resources = content::list_library(&state.db, &LibraryFilter::default()).await?;
    let questions = content::list_past_questions(&state.db, &PastQuestionFilter::default()).await?;

    let stats = HomeStats {
        total_staff: staff.len() as i64,
        total_resources: resources.len() as i64,
        total_questions: questions.len() as i64,
    };
    Ok(Json(HomePayload {
        testimonials: content::approved_testimonials(&state.db, 6).await?,
        announcements: content::active_announcements(&state.db, 5).await?,
        recent_staff: staff.into_iter().take(3).collect(),
        current_excos: excos.into_iter().take(4).collect(),
        recent_resources: resources.into_iter().take(6).collect(),
        recent_questions: questions.into_iter().take(5).collect(),
        stats,
    }))
}

pub async fn staff_list(State(state): State<AppState>) -> Result<Json<Vec<Staff>>, PortalError> {
    Ok(Json(content::list_staff(&state.db).await?))
}

pub async fn exco_list(State(state): State<AppState>) -> Result<Json<Vec<Exco>>, PortalError> {
    Ok(Json(content::list_excos(&state.db).await?))
}

#[derive(Deserialize)]
pub struct PastQuestionParams {
    pub level: Option<String>,
    pub semester: Option<String>,
    pub year: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastQuestionPage {
    pub questions: Vec<PastQuestion>,
    pub years: Vec<i64>,
}

pub async fn past_questions(
    State(state): State<AppState>,
    Query(params): Query<PastQuestionParams>,
) -> Result<Json<PastQuestionPage>, PortalError> {
    let year = match opt(params.year) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| PortalError::invalid("year", "year must be a number"))?,
        ),
        None => None,
    };
    let filter = PastQuestionFilter {
        level: opt(params.level),
        semester: opt(params.semester),
        year,
    };
    Ok(Json(PastQuestionPage {
        questions: content::list_past_questions(&state.db, &filter).await?,
        years: content::past_question_years(&state.db).await?,
    }))
}

#[derive(Deserialize)]
pub struct LibraryParams {
    pub category: Option<String>,
    pub level: Option<String>,
}

pub async fn library(
    State(state): State<AppState>,
    Query(params): Query<LibraryParams>,
) -> Result<Json<Vec<LibraryResource>>, PortalError> {
    let filter = LibraryFilter {
        category: opt(params.category),
        level: opt(params.level),
    };
    Ok(Json(content::list_library(&state.db, &filter).await?))
}

#[derive(Deserialize)]
pub struct TestimonialForm {
    pub name: String,
    pub message: String,
    pub rating: Option<i64>,
}

pub async fn submit_testimonial(
    State(state): State<AppState>,
    Form(form): Form<TestimonialForm>,
) -> Result<(StatusCode, Json<Testimonial>), PortalError> {
    let testimonial = content::submit_testimonial(
        &state.db,
        TestimonialInput {
            name: form.name,
            message: form.message,
            rating: form.rating.unwrap_or(5),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

#[derive(Deserialize)]
pub struct HandbookParams {
    pub level: Option<String>,
    pub semester: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandbookPage {
    pub level: String,
    pub semester: String,
    pub courses: Vec<HandbookEntry>,
    pub total_credits: i64,
}

pub async fn course_handbook(
    State(state): State<AppState>,
    Query(params): Query<HandbookParams>,
) -> Result<Json<HandbookPage>, PortalError> {
    let level = opt(params.level).unwrap_or_else(|| "100".to_string());
    let semester = opt(params.semester).unwrap_or_else(|| "First".to_string());
    let (courses, total_credits) = content::handbook_section(&state.db, &level, &semester).await?;
    Ok(Json(HandbookPage {
        level,
        semester,
        courses,
        total_credits,
    }))
}

#[derive(Deserialize)]
pub struct TimetableParams {
    #[serde(rename = "type")]
    pub timetable_type: Option<String>,
    pub level: Option<String>,
}

pub async fn timetables(
    State(state): State<AppState>,
    Query(params): Query<TimetableParams>,
) -> Result<Json<Vec<Timetable>>, PortalError> {
    let kind = opt(params.timetable_type).unwrap_or_else(|| "Exam".to_string());
    let level = opt(params.level).filter(|l| l != "All");
    Ok(Json(
        content::published_timetables(&state.db, &kind, level.as_deref()).await?,
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPage {
    pub calendar: Option<AcademicCalendar>,
    pub all_calendars: Vec<AcademicCalendar>,
}

pub async fn academic_calendar(
    State(state): State<AppState>,
) -> Result<Json<CalendarPage>, PortalError> {
    Ok(Json(CalendarPage {
        calendar: calendar::active(&state.db).await?,
        all_calendars: calendar::recent(&state.db, 5).await?,
    }))
}

#[derive(Deserialize)]
pub struct VerifyParams {
    pub code: String,
}

pub async fn verify_receipt(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<dues::Verification>, PortalError> {
    Ok(Json(dues::verify(&state.db, &params.code).await?))
}
