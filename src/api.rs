use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use tower_http::cors::CorsLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod err;
pub mod gpa;
pub mod receipt;
pub mod routes;

use config::Config;
use err::PortalError;
use routes::{admin, public, student};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Config,
}

impl AppState {
    pub async fn build(config: Config) -> Result<Self, PortalError> {
        let db = db::init_db(&config.database_url).await?;
        auth::bootstrap_admin(
            &db,
            config.admin_username.as_deref(),
            config.admin_password.as_deref(),
        )
        .await?;
        Ok(AppState { db, config })
    }
}

/// The whole HTTP surface. Reads are GET, every mutation is POST; the
/// student and admin sections are gated inside their handlers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let public = Router::new()
        .route("/", get(public::home))
        .route("/staff", get(public::staff_list))
        .route("/excos", get(public::exco_list))
        .route("/past-questions", get(public::past_questions))
        .route("/library", get(public::library))
        .route("/testimonials", post(public::submit_testimonial))
        .route("/handbook", get(public::course_handbook))
        .route("/timetables", get(public::timetables))
        .route("/calendar", get(public::academic_calendar))
        .route("/receipts/verify", get(public::verify_receipt));

    let portal = Router::new()
        .route("/portal/register", post(student::register))
        .route("/portal/login", post(student::login))
        .route("/portal/logout", post(student::logout))
        .route("/portal/dashboard", get(student::dashboard))
        .route(
            "/portal/profile",
            get(student::profile).post(student::update_profile),
        )
        .route("/portal/account/delete", post(student::delete_account))
        .route("/portal/cgpa", get(student::cgpa_calculator))
        .route("/portal/cgpa/calculate", post(student::calculate_cgpa))
        .route("/portal/cgpa/history", get(student::cgpa_history))
        .route("/portal/semesters", post(student::add_semester))
        .route("/portal/semesters/:id", post(student::edit_semester))
        .route("/portal/semesters/:id/delete", post(student::delete_semester))
        .route("/portal/semesters/:id/courses", post(student::add_course))
        .route("/portal/courses/:id", post(student::edit_course))
        .route("/portal/courses/:id/delete", post(student::delete_course))
        .route("/portal/receipt", get(student::my_receipt))
        .route("/portal/receipt/print", get(student::print_receipt));

    let admin = Router::new()
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/users", post(admin::add_admin_user))
        .route("/admin/users/:id/delete", post(admin::delete_admin_user))
        .route("/admin/staff", get(admin::list_staff).post(admin::add_staff))
        .route("/admin/staff/:id", post(admin::edit_staff))
        .route("/admin/staff/:id/delete", post(admin::delete_staff))
        .route("/admin/excos", get(admin::list_excos).post(admin::add_exco))
        .route("/admin/excos/:id", post(admin::edit_exco))
        .route("/admin/excos/:id/delete", post(admin::delete_exco))
        .route(
            "/admin/past-questions",
            get(admin::list_past_questions).post(admin::add_past_question),
        )
        .route("/admin/past-questions/:id", post(admin::edit_past_question))
        .route(
            "/admin/past-questions/:id/delete",
            post(admin::delete_past_question),
        )
        .route(
            "/admin/library",
            get(admin::list_library).post(admin::add_library_resource),
        )
        .route("/admin/library/:id", post(admin::edit_library_resource))
        .route(
            "/admin/library/:id/delete",
            post(admin::delete_library_resource),
        )
        .route("/admin/testimonials", get(admin::list_testimonials))
        .route(
            "/admin/testimonials/:id/approve",
            post(admin::approve_testimonial),
        )
        .route(
            "/admin/testimonials/:id/unapprove",
            post(admin::unapprove_testimonial),
        )
        .route(
            "/admin/testimonials/:id/delete",
            post(admin::delete_testimonial),
        )
        .route(
            "/admin/testimonials/approval",
            post(admin::batch_testimonial_approval),
        )
        .route(
            "/admin/announcements",
            get(admin::list_announcements).post(admin::add_announcement),
        )
        .route("/admin/announcements/:id", post(admin::edit_announcement))
        .route(
            "/admin/announcements/:id/delete",
            post(admin::delete_announcement),
        )
        .route("/admin/dues", get(admin::list_dues).post(admin::add_dues))
        .route("/admin/dues/:id", post(admin::edit_dues))
        .route("/admin/dues/:id/approve", post(admin::approve_dues))
        .route("/admin/dues/:id/delete", post(admin::delete_dues))
        .route("/admin/dues/approval", post(admin::batch_dues_approval))
        .route(
            "/admin/handbook",
            get(admin::list_handbook).post(admin::add_handbook_entry),
        )
        .route("/admin/handbook/:id", post(admin::edit_handbook_entry))
        .route(
            "/admin/handbook/:id/delete",
            post(admin::delete_handbook_entry),
        )
        .route(
            "/admin/timetables",
            get(admin::list_timetables).post(admin::add_timetable),
        )
        .route("/admin/timetables/:id", post(admin::edit_timetable))
        .route("/admin/timetables/:id/delete", post(admin::delete_timetable))
        .route(
            "/admin/calendars",
            get(admin::list_calendars).post(admin::add_calendar),
        )
        .route("/admin/calendars/:id", post(admin::edit_calendar))
        .route("/admin/calendars/:id/delete", post(admin::delete_calendar));

    Router::new()
        .merge(public)
        .merge(portal)
        .merge(admin)
        .layer(cors)
        .with_state(state)
}
