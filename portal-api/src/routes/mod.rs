//! Route handlers

pub mod assets;
pub mod dashboard;
pub mod risks;
pub mod soa;
pub mod treatment;

use std::str::FromStr;

use axum::http::header;

use grc_common::GrcError;
use grc_registers::{Direction, ExportFormat};

use crate::error::ApiResult;

/// Parse an optional query-string value; empty strings mean "unset"
pub fn parse_opt<T>(value: &Option<String>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = GrcError>,
{
    match value.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(s.parse::<T>()?)),
        None => Ok(None),
    }
}

/// Parse sort direction, defaulting to ascending
pub fn parse_direction(value: &Option<String>) -> ApiResult<Direction> {
    Ok(parse_opt(value)?.unwrap_or_default())
}

/// Parse an export format, defaulting to CSV
pub fn parse_format(value: &Option<String>) -> ApiResult<ExportFormat> {
    Ok(parse_opt(value)?.unwrap_or(ExportFormat::Csv))
}

/// Content type for an export download
pub fn export_content_type(format: ExportFormat) -> (header::HeaderName, &'static str) {
    match format {
        ExportFormat::Csv => (header::CONTENT_TYPE, "text/csv"),
        ExportFormat::Json => (header::CONTENT_TYPE, "application/json"),
    }
}

/// Fallback actor recorded when a mutation carries no actor
pub fn console_actor() -> String {
    "console".to_string()
}

pub fn default_page() -> usize {
    1
}

pub fn default_per_page() -> usize {
    10
}
