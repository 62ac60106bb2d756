use crate::handlers::reference_date;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::DueStatus;
use model::entities::{family_member, schedule};
use projector::{due_status, next_due_for_schedule, ordinal_suffix, validate_definition};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating a schedule
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateScheduleRequest {
    /// Name of the schedule
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Frequency: Monthly, Quarterly, HalfYearly, Yearly or Custom
    pub frequency: String,
    /// Day of month the payment is due (1-31)
    pub due_day: i32,
    /// Due months (1-12) for Yearly/Custom frequencies
    pub due_months: Option<Vec<u32>>,
    /// Date before which no occurrence is active
    pub start_date: NaiveDate,
    /// Expected amount per occurrence (must be positive)
    pub amount: Decimal,
    /// Owning family member
    pub family_member_id: i32,
}

/// Request body for updating a schedule
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateScheduleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub due_day: Option<i32>,
    pub due_months: Option<Vec<u32>>,
    pub start_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

/// Schedule response model, enriched with the projected next
/// occurrence for the request's reference date
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub frequency: String,
    pub due_day: i32,
    /// Display form of the due day ("1st", "22nd", ...)
    pub due_day_display: String,
    pub due_months: Option<Vec<u32>>,
    pub start_date: NaiveDate,
    pub amount: Decimal,
    pub is_auto_linked: bool,
    pub linked_kind: Option<String>,
    pub linked_id: Option<i32>,
    pub family_member_id: i32,
    /// Next occurrence on or after the reference date; None for a
    /// malformed definition (no resolvable due months)
    pub next_due_date: Option<NaiveDate>,
    /// Classification of the next occurrence against the reference date
    pub due_status: Option<DueStatus>,
}

impl ScheduleResponse {
    /// Builds the response, projecting the next occurrence as of the
    /// given reference date.
    pub fn from_model(model: schedule::Model, as_of: NaiveDate) -> Self {
        let next_due = next_due_for_schedule(&model, as_of);
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            frequency: format!("{:?}", model.frequency),
            due_day: model.due_day,
            due_day_display: format!(
                "{}{}",
                model.due_day,
                ordinal_suffix(model.due_day.max(0) as u32)
            ),
            due_months: model.due_months.map(|m| m.0),
            start_date: model.start_date,
            amount: model.amount,
            is_auto_linked: model.is_auto_linked,
            linked_kind: model.linked_kind.map(|k| format!("{:?}", k)),
            linked_id: model.linked_id,
            family_member_id: model.family_member_id,
            next_due_date: next_due,
            due_status: next_due.map(|d| due_status(d, as_of)),
        }
    }
}

/// Query parameters for listing schedules
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ScheduleQuery {
    /// Page number (default: 1)
    pub page: Option<u64>,
    /// Page size (default: 50)
    pub limit: Option<u64>,
    /// Filter by owning family member
    pub family_member_id: Option<i32>,
    /// Filter by frequency
    pub frequency: Option<String>,
    /// Reference date for next-due projection (default: today)
    pub as_of: Option<NaiveDate>,
}

/// Query parameters for a single-schedule view
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ScheduleViewQuery {
    /// Reference date for next-due projection (default: today)
    pub as_of: Option<NaiveDate>,
}

/// Helper function to parse a frequency string to the entity enum
pub(crate) fn parse_frequency(frequency_str: &str) -> Result<schedule::Frequency, String> {
    match frequency_str {
        "Monthly" => Ok(schedule::Frequency::Monthly),
        "Quarterly" => Ok(schedule::Frequency::Quarterly),
        "HalfYearly" => Ok(schedule::Frequency::HalfYearly),
        "Yearly" => Ok(schedule::Frequency::Yearly),
        "Custom" => Ok(schedule::Frequency::Custom),
        _ => Err(format!("Invalid frequency: {}", frequency_str)),
    }
}

fn validation_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            code: "VALIDATION_ERROR".to_string(),
            success: false,
        }),
    )
}

fn auto_linked_error(sched: &schedule::Model) -> (StatusCode, Json<ErrorResponse>) {
    let source = sched
        .linked_kind
        .as_ref()
        .map(|k| format!("{:?}", k).to_lowercase())
        .unwrap_or_else(|| "source".to_string());
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: format!(
                "Schedule '{}' is auto-linked; modify the {} record it is derived from instead",
                sched.name, source
            ),
            code: "AUTO_LINKED_SCHEDULE".to_string(),
            success: false,
        }),
    )
}

/// Create a new schedule
#[utoipa::path(
    post,
    path = "/api/v1/schedules",
    tag = "schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created successfully", body = ApiResponse<ScheduleResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduleResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_schedule function");
    debug!("Creating schedule: {}", request.name);

    let frequency = match parse_frequency(&request.frequency) {
        Ok(f) => f,
        Err(e) => {
            warn!("Invalid frequency: {}", e);
            return Err(validation_error(e));
        }
    };

    let due_months = request.due_months.map(schedule::DueMonths::new);

    // Definition rules are checked here at the boundary, not inside
    // the date math (a malformed row reaching the projector degrades
    // to "no next occurrence" instead of failing a view).
    if let Err(e) =
        validate_definition(&frequency, request.due_day, due_months.as_ref(), request.amount)
    {
        warn!("Schedule validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

    // The owning family member must exist
    match family_member::Entity::find_by_id(request.family_member_id)
        .one(&state.db)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Family member with ID {} not found", request.family_member_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!(
                        "Family member with id {} does not exist",
                        request.family_member_id
                    ),
                    code: "FAMILY_MEMBER_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(e) => {
            error!("Database error while checking family member: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to verify family member".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ));
        }
    }

    let new_schedule = schedule::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        frequency: Set(frequency),
        due_day: Set(request.due_day),
        due_months: Set(due_months),
        start_date: Set(request.start_date),
        amount: Set(request.amount),
        is_auto_linked: Set(false),
        linked_kind: Set(None),
        linked_id: Set(None),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    match new_schedule.insert(&state.db).await {
        Ok(sched) => {
            info!("Successfully created schedule with ID: {}", sched.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ScheduleResponse::from_model(sched, reference_date(None)),
                message: "Schedule created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            error!("Failed to create schedule: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create schedule".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Get all schedules
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    tag = "schedules",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Schedules retrieved successfully", body = ApiResponse<Vec<ScheduleResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_schedules(
    Query(query): Query<ScheduleQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ScheduleResponse>>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering get_schedules function");

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    let as_of = reference_date(query.as_of);

    debug!("Fetching schedules - page: {}, limit: {}, as_of: {}", page, limit, as_of);

    let mut query_builder = schedule::Entity::find();

    if let Some(family_member_id) = query.family_member_id {
        query_builder =
            query_builder.filter(schedule::Column::FamilyMemberId.eq(family_member_id));
    }

    if let Some(frequency_str) = &query.frequency {
        let frequency = match parse_frequency(frequency_str) {
            Ok(f) => f,
            Err(e) => {
                warn!("Invalid frequency filter: {}", e);
                return Err(validation_error(e));
            }
        };
        query_builder = query_builder.filter(schedule::Column::Frequency.eq(frequency));
    }

    match query_builder
        .order_by_asc(schedule::Column::Id)
        .paginate(&state.db, limit)
        .fetch_page(page - 1)
        .await
    {
        Ok(schedules) => {
            info!("Successfully retrieved {} schedules", schedules.len());
            let response_data: Vec<ScheduleResponse> = schedules
                .into_iter()
                .map(|s| ScheduleResponse::from_model(s, as_of))
                .collect();

            let response = ApiResponse {
                data: response_data,
                message: "Schedules retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to retrieve schedules: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve schedules".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Get a specific schedule by ID
#[utoipa::path(
    get,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(
        ("schedule_id" = i32, Path, description = "Schedule ID"),
        ScheduleViewQuery,
    ),
    responses(
        (status = 200, description = "Schedule retrieved successfully", body = ApiResponse<ScheduleResponse>),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_schedule(
    Path(schedule_id): Path<i32>,
    Query(query): Query<ScheduleViewQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduleResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_schedule function");
    debug!("Fetching schedule with ID: {}", schedule_id);

    match schedule::Entity::find_by_id(schedule_id).one(&state.db).await {
        Ok(Some(sched)) => {
            info!("Successfully retrieved schedule: {}", sched.name);
            let response = ApiResponse {
                data: ScheduleResponse::from_model(sched, reference_date(query.as_of)),
                message: "Schedule retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Ok(None) => {
            warn!("Schedule with ID {} not found", schedule_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Schedule with id {} does not exist", schedule_id),
                    code: "SCHEDULE_NOT_FOUND".to_string(),
                    success: false,
                }),
            ))
        }
        Err(e) => {
            error!("Database error while fetching schedule: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve schedule".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Update a schedule
///
/// Auto-linked schedules are rejected here, server-side: their terms
/// belong to the insurance policy, loan or investment they are derived
/// from.
#[utoipa::path(
    put,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(
        ("schedule_id" = i32, Path, description = "Schedule ID"),
    ),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated successfully", body = ApiResponse<ScheduleResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 409, description = "Schedule is auto-linked", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_schedule(
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduleResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_schedule function");
    debug!("Updating schedule with ID: {}", schedule_id);

    let existing = match schedule::Entity::find_by_id(schedule_id).one(&state.db).await {
        Ok(Some(sched)) => sched,
        Ok(None) => {
            warn!("Schedule with ID {} not found", schedule_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Schedule with id {} does not exist", schedule_id),
                    code: "SCHEDULE_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(e) => {
            error!("Database error while fetching schedule: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve schedule".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ));
        }
    };

    if existing.is_auto_linked {
        warn!("Rejected update of auto-linked schedule {}", schedule_id);
        return Err(auto_linked_error(&existing));
    }

    // Merge the requested changes over the stored terms, then validate
    // the merged definition as a whole.
    let frequency = match &request.frequency {
        Some(frequency_str) => match parse_frequency(frequency_str) {
            Ok(f) => f,
            Err(e) => {
                warn!("Invalid frequency: {}", e);
                return Err(validation_error(e));
            }
        },
        None => existing.frequency.clone(),
    };
    let due_day = request.due_day.unwrap_or(existing.due_day);
    let due_months = match request.due_months {
        Some(months) => Some(schedule::DueMonths::new(months)),
        None => existing.due_months.clone(),
    };
    let amount = request.amount.unwrap_or(existing.amount);

    if let Err(e) = validate_definition(&frequency, due_day, due_months.as_ref(), amount) {
        warn!("Schedule validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

    let mut update_model: schedule::ActiveModel = existing.into();

    if let Some(name) = request.name {
        update_model.name = Set(name);
    }
    if let Some(description) = request.description {
        update_model.description = Set(Some(description));
    }
    if let Some(start_date) = request.start_date {
        update_model.start_date = Set(start_date);
    }
    update_model.frequency = Set(frequency);
    update_model.due_day = Set(due_day);
    update_model.due_months = Set(due_months);
    update_model.amount = Set(amount);

    match update_model.update(&state.db).await {
        Ok(updated) => {
            info!("Successfully updated schedule with ID: {}", updated.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ScheduleResponse::from_model(updated, reference_date(None)),
                message: "Schedule updated successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to update schedule: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update schedule".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Delete a schedule
///
/// Auto-linked schedules cannot be deleted directly; delete the source
/// entity instead.
#[utoipa::path(
    delete,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(
        ("schedule_id" = i32, Path, description = "Schedule ID"),
    ),
    responses(
        (status = 200, description = "Schedule deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 409, description = "Schedule is auto-linked", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_schedule(
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_schedule function");
    debug!("Deleting schedule with ID: {}", schedule_id);

    match schedule::Entity::find_by_id(schedule_id).one(&state.db).await {
        Ok(Some(sched)) => {
            if sched.is_auto_linked {
                warn!("Rejected deletion of auto-linked schedule {}", schedule_id);
                return Err(auto_linked_error(&sched));
            }

            match schedule::Entity::delete_by_id(schedule_id).exec(&state.db).await {
                Ok(_) => {
                    info!("Successfully deleted schedule with ID: {}", schedule_id);
                    state.cache.invalidate_all();
                    let response = ApiResponse {
                        data: format!("Schedule with id {} deleted successfully", schedule_id),
                        message: "Schedule deleted successfully".to_string(),
                        success: true,
                    };
                    Ok((StatusCode::OK, Json(response)))
                }
                Err(e) => {
                    error!("Failed to delete schedule: {}", e);
                    Err((
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: "Failed to delete schedule".to_string(),
                            code: "DATABASE_ERROR".to_string(),
                            success: false,
                        }),
                    ))
                }
            }
        }
        Ok(None) => {
            warn!("Schedule with ID {} not found", schedule_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Schedule with id {} does not exist", schedule_id),
                    code: "SCHEDULE_NOT_FOUND".to_string(),
                    success: false,
                }),
            ))
        }
        Err(e) => {
            error!("Database error while checking schedule existence: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to check schedule existence".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}
