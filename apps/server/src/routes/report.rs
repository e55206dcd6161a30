//! # Report Routes

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;
use pos_core::SalesReport;

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    /// Inclusive, format YYYY-MM-DD. Missing = open.
    pub start_date: Option<String>,
    /// Inclusive, format YYYY-MM-DD. Missing = open.
    pub end_date: Option<String>,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> Result<Json<SalesReport>, ApiError> {
    let start = query
        .start_date
        .as_deref()
        .map(|v| parse_date("start_date", v))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|v| parse_date("end_date", v))
        .transpose()?;

    let report = state.db.reports().sales_report(start, end).await?;
    Ok(Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sales", get(sales_report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("start_date", "2026-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
        assert!(parse_date("start_date", "31/01/2026").is_err());
        assert!(parse_date("start_date", "not-a-date").is_err());
    }
}
