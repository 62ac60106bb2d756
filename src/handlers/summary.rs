use crate::handlers::reference_date;
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::MonthSummary;
use model::entities::{schedule, schedule_instance};
use projector::{aggregate_for_month, aggregate_for_year, days_in_month};
use sea_orm::{ColumnTrait, DbConn, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the monthly summary
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct SummaryQuery {
    /// Calendar year
    pub year: i32,
    /// Calendar month (1-12)
    pub month: u32,
    /// Reference date for payment-state derivation (default: today)
    pub as_of: Option<NaiveDate>,
}

/// Query parameters for the yearly calendar
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CalendarQuery {
    /// Reference date for payment-state derivation (default: today)
    pub as_of: Option<NaiveDate>,
}

fn database_error(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

async fn load_schedules(db: &DbConn) -> Result<Vec<schedule::Model>, (StatusCode, Json<ErrorResponse>)> {
    schedule::Entity::find().all(db).await.map_err(|e| {
        error!("Failed to load schedules: {}", e);
        database_error("Failed to load schedules")
    })
}

/// Loads the persisted instances whose due dates fall inside the month.
async fn load_instances_for_month(
    db: &DbConn,
    year: i32,
    month: u32,
) -> Result<Vec<schedule_instance::Model>, (StatusCode, Json<ErrorResponse>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        warn!("Invalid month {}/{}", year, month);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("{}-{} is not a valid month", year, month),
                code: "VALIDATION_ERROR".to_string(),
                success: false,
            }),
        )
    })?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
        .unwrap_or(first);

    schedule_instance::Entity::find()
        .filter(schedule_instance::Column::DueDate.gte(first))
        .filter(schedule_instance::Column::DueDate.lte(last))
        .all(db)
        .await
        .map_err(|e| {
            error!("Failed to load instances: {}", e);
            database_error("Failed to load instances")
        })
}

async fn load_instances_for_year(
    db: &DbConn,
    year: i32,
) -> Result<Vec<schedule_instance::Model>, (StatusCode, Json<ErrorResponse>)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        warn!("Invalid year {}", year);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("{} is not a valid year", year),
                code: "VALIDATION_ERROR".to_string(),
                success: false,
            }),
        )
    })?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(first);

    schedule_instance::Entity::find()
        .filter(schedule_instance::Column::DueDate.gte(first))
        .filter(schedule_instance::Column::DueDate.lte(last))
        .all(db)
        .await
        .map_err(|e| {
            error!("Failed to load instances: {}", e);
            database_error("Failed to load instances")
        })
}

/// Get the aggregated payment summary for one month
///
/// Synthesizes an item per schedule occurring in the month and overlays
/// any persisted instances, then totals the paid/pending/overdue
/// buckets. Overdue amounts are also counted as pending.
#[utoipa::path(
    get,
    path = "/api/v1/schedules/summary",
    tag = "summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Summary computed successfully", body = ApiResponse<MonthSummary>),
        (status = 400, description = "Invalid month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_month_summary(
    Query(query): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<MonthSummary>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_month_summary function");

    if !(1..=12).contains(&query.month) {
        warn!("Invalid month: {}", query.month);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Month must be between 1 and 12, got {}", query.month),
                code: "VALIDATION_ERROR".to_string(),
                success: false,
            }),
        ));
    }

    let as_of = reference_date(query.as_of);
    debug!("Computing summary for {}-{:02} as of {}", query.year, query.month, as_of);

    let cache_key = format!("summary_{}_{}_{}", query.year, query.month, as_of);
    if let Some(CachedData::Summary(summary)) = state.cache.get(&cache_key).await {
        info!("Returning cached summary for {}-{:02}", query.year, query.month);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: summary,
                message: "Summary retrieved from cache".to_string(),
                success: true,
            }),
        ));
    }

    let schedules = load_schedules(&state.db).await?;
    let instances = load_instances_for_month(&state.db, query.year, query.month).await?;

    let summary = aggregate_for_month(&schedules, &instances, query.year, query.month, as_of);
    info!(
        "Computed summary for {}-{:02}: {} items",
        query.year,
        query.month,
        summary.items.len()
    );

    state
        .cache
        .insert(cache_key, CachedData::Summary(summary.clone()))
        .await;

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: summary,
            message: "Summary computed successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get the full-year payment calendar (12 monthly summaries)
#[utoipa::path(
    get,
    path = "/api/v1/schedules/calendar/{year}",
    tag = "summary",
    params(
        ("year" = i32, Path, description = "Calendar year"),
        CalendarQuery,
    ),
    responses(
        (status = 200, description = "Calendar computed successfully", body = ApiResponse<Vec<MonthSummary>>),
        (status = 400, description = "Invalid year", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_year_calendar(
    Path(year): Path<i32>,
    Query(query): Query<CalendarQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<MonthSummary>>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_year_calendar function");

    let as_of = reference_date(query.as_of);
    debug!("Computing calendar for {} as of {}", year, as_of);

    let cache_key = format!("calendar_{}_{}", year, as_of);
    if let Some(CachedData::Calendar(months)) = state.cache.get(&cache_key).await {
        info!("Returning cached calendar for {}", year);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: months,
                message: "Calendar retrieved from cache".to_string(),
                success: true,
            }),
        ));
    }

    let schedules = load_schedules(&state.db).await?;
    let instances = load_instances_for_year(&state.db, year).await?;

    let months = aggregate_for_year(&schedules, &instances, year, as_of);
    info!("Computed calendar for {}", year);

    state
        .cache
        .insert(cache_key, CachedData::Calendar(months.clone()))
        .await;

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: months,
            message: "Calendar computed successfully".to_string(),
            success: true,
        }),
    ))
}
