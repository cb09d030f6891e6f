use std::str::FromStr;

use axum_extra::extract::cookie::CookieJar;

use super::err::PortalError;

pub mod admin;
pub mod public;
pub mod student;

/// Parses a fixed-vocabulary form field, turning the message into a
/// field-level validation failure.
pub(crate) fn parse_field<T>(field: &'static str, value: &str) -> Result<T, PortalError>
where
    T: FromStr<Err = String>,
{
    value
        .trim()
        .parse()
        .map_err(|message: String| PortalError::invalid(field, message))
}

/// Optional form fields arrive as empty strings; collapse those to None.
pub(crate) fn opt(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

pub(crate) fn session_token(jar: &CookieJar, cookie: &str) -> Option<String> {
    jar.get(cookie).map(|c| c.value().to_string())
}
