//! Utilidades de validación y fechas
//!
//! Parseo estricto de fechas (YYYY-MM-DD) y meses (YYYY-MM), y la fecha
//! actual en hora de Japón, que es la que decide "la carta de hoy".

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

use super::errors::AppError;

/// Asia/Tokyo no tiene horario de verano: UTC+9 fijo
const JST_OFFSET_HOURS: i64 = 9;

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDate)
}

/// Validar un parámetro de fecha opcional
pub fn require_date(value: Option<&str>) -> Result<NaiveDate, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_date(v),
        _ => Err(AppError::InvalidDate),
    }
}

/// Validar un mes YYYY-MM y devolver su primer día
pub fn validate_month(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidMonth)
}

/// Fecha de hoy en JST
pub fn today_jst() -> NaiveDate {
    (Utc::now().naive_utc() + Duration::hours(JST_OFFSET_HOURS)).date()
}

/// Fecha de ayer en JST
pub fn yesterday_jst() -> NaiveDate {
    today_jst() - Duration::days(1)
}

/// Primer día del mes de una fecha
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Número de días del mes que empieza en `first`
pub fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(31)
}

pub fn previous_month(first: NaiveDate) -> NaiveDate {
    first.checked_sub_months(Months::new(1)).unwrap_or(first)
}

pub fn next_month(first: NaiveDate) -> NaiveDate {
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

/// Formato YYYY-MM
pub fn format_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
