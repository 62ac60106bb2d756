use crate::handlers::reference_date;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Datelike, NaiveDate};
use common::PaymentState;
use model::entities::{schedule, schedule_instance};
use projector::resolve_due_months;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

/// Request body for materializing a schedule occurrence
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateInstanceRequest {
    /// Concrete due date of the occurrence being tracked
    pub due_date: NaiveDate,
    /// Expected amount; defaults to the definition's amount
    pub expected_amount: Option<Decimal>,
}

/// Request body for recording a payment against an instance
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordPaymentRequest {
    /// Amount actually paid; defaults to the expected amount
    pub paid_amount: Option<Decimal>,
    /// Date of payment; defaults to today
    pub paid_date: Option<NaiveDate>,
}

/// Instance response model with the payment state derived against the
/// reference date (Overdue is never stored, only computed)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstanceResponse {
    pub id: i32,
    pub schedule_id: i32,
    pub due_date: NaiveDate,
    pub expected_amount: Decimal,
    pub state: PaymentState,
    pub paid_date: Option<NaiveDate>,
    pub paid_amount: Option<Decimal>,
}

impl InstanceResponse {
    pub fn from_model(model: schedule_instance::Model, as_of: NaiveDate) -> Self {
        let state = match model.status {
            schedule_instance::InstanceStatus::Paid => PaymentState::Paid,
            schedule_instance::InstanceStatus::Pending => {
                if model.due_date < as_of {
                    PaymentState::Overdue
                } else {
                    PaymentState::Pending
                }
            }
        };
        Self {
            id: model.id,
            schedule_id: model.schedule_id,
            due_date: model.due_date,
            expected_amount: model.expected_amount,
            state,
            paid_date: model.paid_date,
            paid_amount: model.paid_amount,
        }
    }
}

/// Query parameters for listing a schedule's instances
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct InstanceQuery {
    /// Filter instances due on or after this date
    pub from_date: Option<NaiveDate>,
    /// Filter instances due on or before this date
    pub to_date: Option<NaiveDate>,
    /// Reference date for deriving the Overdue state (default: today)
    pub as_of: Option<NaiveDate>,
}

fn schedule_not_found(schedule_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Schedule with id {} does not exist", schedule_id),
            code: "SCHEDULE_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Checks that a due date is consistent with the schedule's definition:
/// on or after the start date, and in one of its due months.
fn due_date_matches_definition(sched: &schedule::Model, due_date: NaiveDate) -> Result<(), String> {
    if due_date < sched.start_date {
        return Err(format!(
            "Due date {} is before the schedule start date {}",
            due_date, sched.start_date
        ));
    }
    if matches!(sched.frequency, schedule::Frequency::Monthly) {
        return Ok(());
    }
    let months = resolve_due_months(&sched.frequency, sched.due_months.as_ref())
        .map_err(|e| e.to_string())?;
    if months.contains(&due_date.month()) {
        Ok(())
    } else {
        Err(format!(
            "Month {} is not a due month of schedule '{}'",
            due_date.month(),
            sched.name
        ))
    }
}

/// Materialize an occurrence of a schedule as a tracked instance
///
/// The expected amount is copied from the definition at creation time;
/// later edits to the definition do not rewrite it.
#[utoipa::path(
    post,
    path = "/api/v1/schedules/{schedule_id}/instances",
    tag = "instances",
    params(
        ("schedule_id" = i32, Path, description = "Schedule ID"),
    ),
    request_body = CreateInstanceRequest,
    responses(
        (status = 201, description = "Instance created successfully", body = ApiResponse<InstanceResponse>),
        (status = 400, description = "Due date does not match the schedule", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 409, description = "Instance already exists for this due date", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_instance(
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateInstanceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InstanceResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_instance function");
    debug!("Creating instance for schedule {} due {}", schedule_id, request.due_date);

    let sched = match schedule::Entity::find_by_id(schedule_id).one(&state.db).await {
        Ok(Some(sched)) => sched,
        Ok(None) => {
            warn!("Schedule with ID {} not found", schedule_id);
            return Err(schedule_not_found(schedule_id));
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

    if let Err(e) = due_date_matches_definition(&sched, request.due_date) {
        warn!("Rejected instance for schedule {}: {}", schedule_id, e);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e,
                code: "INVALID_DUE_DATE".to_string(),
                success: false,
            }),
        ));
    }

    let new_instance = schedule_instance::ActiveModel {
        schedule_id: Set(schedule_id),
        status: Set(schedule_instance::InstanceStatus::Pending),
        due_date: Set(request.due_date),
        expected_amount: Set(request.expected_amount.unwrap_or(sched.amount)),
        paid_date: Set(None),
        paid_amount: Set(None),
        ..Default::default()
    };

    match new_instance.insert(&state.db).await {
        Ok(instance) => {
            info!("Successfully created instance with ID: {}", instance.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: InstanceResponse::from_model(instance, reference_date(None)),
                message: "Instance created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        // Database-agnostic unique-violation check; works for both the
        // sqlite and postgres backends
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            warn!(
                "Instance for schedule {} due {} already exists",
                schedule_id, request.due_date
            );
            Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!(
                        "An instance of schedule {} due on {} already exists",
                        schedule_id, request.due_date
                    ),
                    code: "INSTANCE_EXISTS".to_string(),
                    success: false,
                }),
            ))
        }
        Err(e) => {
            error!("Failed to create instance: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create instance".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Get the tracked instances of a schedule
#[utoipa::path(
    get,
    path = "/api/v1/schedules/{schedule_id}/instances",
    tag = "instances",
    params(
        ("schedule_id" = i32, Path, description = "Schedule ID"),
        InstanceQuery,
    ),
    responses(
        (status = 200, description = "Instances retrieved successfully", body = ApiResponse<Vec<InstanceResponse>>),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_schedule_instances(
    Path(schedule_id): Path<i32>,
    Query(query): Query<InstanceQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<InstanceResponse>>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering get_schedule_instances function");
    debug!("Fetching instances for schedule {}", schedule_id);

    match schedule::Entity::find_by_id(schedule_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Schedule with ID {} not found", schedule_id);
            return Err(schedule_not_found(schedule_id));
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
    }

    let as_of = reference_date(query.as_of);
    let mut query_builder = schedule_instance::Entity::find()
        .filter(schedule_instance::Column::ScheduleId.eq(schedule_id));

    if let Some(from_date) = query.from_date {
        query_builder = query_builder.filter(schedule_instance::Column::DueDate.gte(from_date));
    }
    if let Some(to_date) = query.to_date {
        query_builder = query_builder.filter(schedule_instance::Column::DueDate.lte(to_date));
    }

    match query_builder
        .order_by_asc(schedule_instance::Column::DueDate)
        .all(&state.db)
        .await
    {
        Ok(instances) => {
            info!("Successfully retrieved {} instances", instances.len());
            let response_data: Vec<InstanceResponse> = instances
                .into_iter()
                .map(|i| InstanceResponse::from_model(i, as_of))
                .collect();

            let response = ApiResponse {
                data: response_data,
                message: "Instances retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to retrieve instances: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve instances".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Record a payment against an instance
///
/// Paid is terminal; paying an already-paid instance is a conflict.
#[utoipa::path(
    put,
    path = "/api/v1/instances/{instance_id}/payment",
    tag = "instances",
    params(
        ("instance_id" = i32, Path, description = "Instance ID"),
    ),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded successfully", body = ApiResponse<InstanceResponse>),
        (status = 404, description = "Instance not found", body = ErrorResponse),
        (status = 409, description = "Instance is already paid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn record_payment(
    Path(instance_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InstanceResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering record_payment function");
    debug!("Recording payment for instance {}", instance_id);

    let instance = match schedule_instance::Entity::find_by_id(instance_id).one(&state.db).await {
        Ok(Some(instance)) => instance,
        Ok(None) => {
            warn!("Instance with ID {} not found", instance_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Instance with id {} does not exist", instance_id),
                    code: "INSTANCE_NOT_FOUND".to_string(),
                    success: false,
                }),
            ));
        }
        Err(e) => {
            error!("Database error while fetching instance: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to retrieve instance".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ));
        }
    };

    if matches!(instance.status, schedule_instance::InstanceStatus::Paid) {
        warn!("Instance {} is already paid", instance_id);
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Instance with id {} is already paid", instance_id),
                code: "INSTANCE_ALREADY_PAID".to_string(),
                success: false,
            }),
        ));
    }

    let expected_amount = instance.expected_amount;
    let mut update_model: schedule_instance::ActiveModel = instance.into();
    update_model.status = Set(schedule_instance::InstanceStatus::Paid);
    update_model.paid_amount = Set(Some(request.paid_amount.unwrap_or(expected_amount)));
    update_model.paid_date = Set(Some(request.paid_date.unwrap_or_else(|| reference_date(None))));

    match update_model.update(&state.db).await {
        Ok(updated) => {
            info!("Successfully recorded payment for instance {}", updated.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: InstanceResponse::from_model(updated, reference_date(None)),
                message: "Payment recorded successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to record payment: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to record payment".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                }),
            ))
        }
    }
}
