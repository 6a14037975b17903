use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    errors::ServiceError,
    services::reports::{Report, ReportExport, ReportPeriod, ReportRange},
    ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Anchor date for daily/monthly/yearly reports, defaults to today
    pub date: Option<NaiveDate>,
    /// Month (1-12) and year, an alternative anchor for monthly/yearly reports
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// daily, monthly, yearly or custom
    #[serde(rename = "type")]
    pub report_type: String,
    pub date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<ExportQuery> for ReportQuery {
    fn from(query: ExportQuery) -> Self {
        ReportQuery {
            date: query.date,
            month: query.month,
            year: query.year,
            start_date: query.start_date,
            end_date: query.end_date,
        }
    }
}

fn anchor_date(query: &ReportQuery) -> Result<NaiveDate, ServiceError> {
    if query.month.is_none() && query.year.is_none() {
        return Ok(query.date.unwrap_or_else(|| Utc::now().date_naive()));
    }
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ServiceError::ValidationError("Bulan tidak valid".to_string()))
}

fn resolve_range(period: ReportPeriod, query: &ReportQuery) -> Result<ReportRange, ServiceError> {
    match period {
        ReportPeriod::Daily => Ok(ReportRange::day(anchor_date(query)?)),
        ReportPeriod::Monthly => Ok(ReportRange::month(anchor_date(query)?)),
        ReportPeriod::Yearly => Ok(ReportRange::year(anchor_date(query)?)),
        ReportPeriod::Custom => {
            let (start, end) = query.start_date.zip(query.end_date).ok_or_else(|| {
                ServiceError::ValidationError(
                    "Tanggal mulai dan akhir harus diisi".to_string(),
                )
            })?;
            ReportRange::custom(start, end)
        }
    }
}

fn parse_period(raw: &str) -> Result<ReportPeriod, ServiceError> {
    match raw {
        "daily" => Ok(ReportPeriod::Daily),
        "monthly" => Ok(ReportPeriod::Monthly),
        "yearly" => Ok(ReportPeriod::Yearly),
        "custom" => Ok(ReportPeriod::Custom),
        _ => Err(ServiceError::ValidationError(
            "Jenis laporan tidak valid".to_string(),
        )),
    }
}

async fn build_report(
    state: &AppState,
    period: ReportPeriod,
    query: ReportQuery,
) -> Result<Report, ServiceError> {
    let range = resolve_range(period, &query)?;
    state.services.reports.report(period, range).await
}

#[utoipa::path(
    get,
    path = "/api/reports/daily",
    summary = "Daily report",
    params(("date" = Option<String>, Query, description = "Report date (YYYY-MM-DD), default today")),
    responses(
        (status = 200, description = "Revenue, volume and top lists for the day"),
        (status = 403, description = "Not an owner")
    )
)]
pub async fn daily_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = build_report(&state, ReportPeriod::Daily, query).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn monthly_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = build_report(&state, ReportPeriod::Monthly, query).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn yearly_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = build_report(&state, ReportPeriod::Yearly, query).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn custom_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = build_report(&state, ReportPeriod::Custom, query).await?;
    Ok(Json(ApiResponse::success(report)))
}

fn download_response(export: ReportExport) -> Response {
    (
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/reports/export/excel",
    summary = "Export report as Excel",
    params(
        ("type" = String, Query, description = "daily, monthly, yearly or custom"),
        ("date" = Option<String>, Query, description = "Anchor date for period reports"),
        ("month" = Option<u32>, Query, description = "Month 1-12, anchors monthly reports"),
        ("year" = Option<i32>, Query, description = "Year, anchors monthly and yearly reports"),
        ("start_date" = Option<String>, Query, description = "Custom range start"),
        ("end_date" = Option<String>, Query, description = "Custom range end, inclusive")
    ),
    responses((status = 200, description = "Workbook download"))
)]
pub async fn export_excel(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let period = parse_period(&query.report_type)?;
    let range = resolve_range(period, &ReportQuery::from(query))?;
    let report = state.services.reports.report(period, range).await?;
    let export = state.services.reports.export_excel(period, &report).await?;
    Ok(download_response(export))
}

pub async fn export_pdf(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let period = parse_period(&query.report_type)?;
    let range = resolve_range(period, &ReportQuery::from(query))?;
    let report = state.services.reports.report(period, range).await?;
    let export = state.services.reports.export_pdf(period, &report).await?;
    Ok(download_response(export))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_period_requires_both_dates() {
        let query = ReportQuery {
            start_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            ..Default::default()
        };
        let result = resolve_range(ReportPeriod::Custom, &query);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn month_and_year_anchor_the_monthly_report() {
        let query = ReportQuery {
            month: Some(3),
            year: Some(2024),
            ..Default::default()
        };
        let range = resolve_range(ReportPeriod::Monthly, &query).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        let query = ReportQuery {
            month: Some(13),
            year: Some(2024),
            ..Default::default()
        };
        assert!(resolve_range(ReportPeriod::Monthly, &query).is_err());
    }

    #[test]
    fn unknown_period_is_rejected() {
        assert!(parse_period("weekly").is_err());
        assert!(parse_period("daily").is_ok());
    }
}
