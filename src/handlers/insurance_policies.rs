use crate::handlers::{find_linked_schedule, reference_date};
use crate::handlers::schedules::{parse_frequency, ScheduleResponse};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{family_member, insurance_policy, schedule};
use projector::validate_definition;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating an insurance policy
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateInsurancePolicyRequest {
    pub name: String,
    pub provider: String,
    /// Premium amount per due occurrence (must be positive)
    pub premium: Decimal,
    /// Premium frequency: Monthly, Quarterly, HalfYearly, Yearly or Custom
    pub frequency: String,
    /// Day of month the premium is due (1-31)
    pub due_day: i32,
    /// Due months (1-12) for Yearly/Custom frequencies
    pub due_months: Option<Vec<u32>>,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
}

/// Request body for updating an insurance policy
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateInsurancePolicyRequest {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub premium: Option<Decimal>,
    pub frequency: Option<String>,
    pub due_day: Option<i32>,
    pub due_months: Option<Vec<u32>>,
    pub start_date: Option<NaiveDate>,
}

/// Insurance policy response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsurancePolicyResponse {
    pub id: i32,
    pub name: String,
    pub provider: String,
    pub premium: Decimal,
    pub frequency: String,
    pub due_day: i32,
    pub due_months: Option<Vec<u32>>,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
    /// The premium schedule maintained for this policy
    pub premium_schedule: Option<ScheduleResponse>,
}

impl InsurancePolicyResponse {
    fn from_model(
        model: insurance_policy::Model,
        premium_schedule: Option<schedule::Model>,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            provider: model.provider,
            premium: model.premium,
            frequency: format!("{:?}", model.frequency),
            due_day: model.due_day,
            due_months: model.due_months.map(|m| m.0),
            start_date: model.start_date,
            family_member_id: model.family_member_id,
            premium_schedule: premium_schedule.map(|s| ScheduleResponse::from_model(s, as_of)),
        }
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

fn policy_not_found(policy_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Insurance policy with id {} does not exist", policy_id),
            code: "INSURANCE_POLICY_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Create a new insurance policy
///
/// Also creates the auto-linked premium schedule so the premium shows
/// up in summaries immediately.
#[utoipa::path(
    post,
    path = "/api/v1/insurance-policies",
    tag = "insurance-policies",
    request_body = CreateInsurancePolicyRequest,
    responses(
        (status = 201, description = "Insurance policy created successfully", body = ApiResponse<InsurancePolicyResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_insurance_policy(
    State(state): State<AppState>,
    Json(request): Json<CreateInsurancePolicyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InsurancePolicyResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_insurance_policy function");
    debug!("Creating insurance policy: {}", request.name);

    let frequency = match parse_frequency(&request.frequency) {
        Ok(f) => f,
        Err(e) => {
            warn!("Invalid frequency: {}", e);
            return Err(validation_error(e));
        }
    };

    let due_months = request.due_months.map(schedule::DueMonths::new);
    if let Err(e) =
        validate_definition(&frequency, request.due_day, due_months.as_ref(), request.premium)
    {
        warn!("Insurance policy validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

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
            return Err(database_error("Failed to verify family member"));
        }
    }

    let new_policy = insurance_policy::ActiveModel {
        name: Set(request.name.clone()),
        provider: Set(request.provider),
        premium: Set(request.premium),
        frequency: Set(frequency.clone()),
        due_day: Set(request.due_day),
        due_months: Set(due_months.clone()),
        start_date: Set(request.start_date),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let policy = match new_policy.insert(&state.db).await {
        Ok(policy) => policy,
        Err(e) => {
            error!("Failed to create insurance policy: {}", e);
            return Err(database_error("Failed to create insurance policy"));
        }
    };

    let premium_schedule = schedule::ActiveModel {
        name: Set(format!("{} premium", request.name)),
        description: Set(Some(format!("Premium for insurance policy '{}'", request.name))),
        frequency: Set(frequency),
        due_day: Set(request.due_day),
        due_months: Set(due_months),
        start_date: Set(request.start_date),
        amount: Set(request.premium),
        is_auto_linked: Set(true),
        linked_kind: Set(Some(schedule::LinkedKind::Insurance)),
        linked_id: Set(Some(policy.id)),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let sched = match premium_schedule.insert(&state.db).await {
        Ok(sched) => sched,
        Err(e) => {
            error!("Failed to create premium schedule: {}", e);
            return Err(database_error("Failed to create premium schedule"));
        }
    };

    info!("Successfully created insurance policy with ID: {}", policy.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: InsurancePolicyResponse::from_model(policy, Some(sched), reference_date(None)),
        message: "Insurance policy created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all insurance policies
#[utoipa::path(
    get,
    path = "/api/v1/insurance-policies",
    tag = "insurance-policies",
    responses(
        (status = 200, description = "Insurance policies retrieved successfully", body = ApiResponse<Vec<InsurancePolicyResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_insurance_policies(
    State(state): State<AppState>,
) -> Result<
    (StatusCode, Json<ApiResponse<Vec<InsurancePolicyResponse>>>),
    (StatusCode, Json<ErrorResponse>),
> {
    trace!("Entering get_insurance_policies function");
    debug!("Fetching all insurance policies");

    let as_of = reference_date(None);
    match insurance_policy::Entity::find().all(&state.db).await {
        Ok(policies) => {
            info!("Successfully retrieved {} insurance policies", policies.len());
            let mut response_data = Vec::with_capacity(policies.len());
            for policy in policies {
                let sched =
                    find_linked_schedule(&state.db, schedule::LinkedKind::Insurance, policy.id)
                        .await
                        .map_err(|e| {
                            error!("Failed to load premium schedule: {}", e);
                            database_error("Failed to load premium schedule")
                        })?;
                response_data.push(InsurancePolicyResponse::from_model(policy, sched, as_of));
            }

            let response = ApiResponse {
                data: response_data,
                message: "Insurance policies retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to retrieve insurance policies: {}", e);
            Err(database_error("Failed to retrieve insurance policies"))
        }
    }
}

/// Get a specific insurance policy by ID
#[utoipa::path(
    get,
    path = "/api/v1/insurance-policies/{policy_id}",
    tag = "insurance-policies",
    params(
        ("policy_id" = i32, Path, description = "Insurance policy ID"),
    ),
    responses(
        (status = 200, description = "Insurance policy retrieved successfully", body = ApiResponse<InsurancePolicyResponse>),
        (status = 404, description = "Insurance policy not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_insurance_policy(
    Path(policy_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<InsurancePolicyResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering get_insurance_policy function");
    debug!("Fetching insurance policy with ID: {}", policy_id);

    match insurance_policy::Entity::find_by_id(policy_id).one(&state.db).await {
        Ok(Some(policy)) => {
            let sched = find_linked_schedule(&state.db, schedule::LinkedKind::Insurance, policy.id)
                .await
                .map_err(|e| {
                    error!("Failed to load premium schedule: {}", e);
                    database_error("Failed to load premium schedule")
                })?;
            info!("Successfully retrieved insurance policy: {}", policy.name);
            let response = ApiResponse {
                data: InsurancePolicyResponse::from_model(policy, sched, reference_date(None)),
                message: "Insurance policy retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Ok(None) => {
            warn!("Insurance policy with ID {} not found", policy_id);
            Err(policy_not_found(policy_id))
        }
        Err(e) => {
            error!("Database error while fetching insurance policy: {}", e);
            Err(database_error("Failed to retrieve insurance policy"))
        }
    }
}

/// Update an insurance policy
///
/// Changed premium terms are propagated to the auto-linked schedule;
/// already-materialized instances keep their recorded amounts.
#[utoipa::path(
    put,
    path = "/api/v1/insurance-policies/{policy_id}",
    tag = "insurance-policies",
    params(
        ("policy_id" = i32, Path, description = "Insurance policy ID"),
    ),
    request_body = UpdateInsurancePolicyRequest,
    responses(
        (status = 200, description = "Insurance policy updated successfully", body = ApiResponse<InsurancePolicyResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Insurance policy not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_insurance_policy(
    Path(policy_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateInsurancePolicyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InsurancePolicyResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering update_insurance_policy function");
    debug!("Updating insurance policy with ID: {}", policy_id);

    let existing = match insurance_policy::Entity::find_by_id(policy_id).one(&state.db).await {
        Ok(Some(policy)) => policy,
        Ok(None) => {
            warn!("Insurance policy with ID {} not found", policy_id);
            return Err(policy_not_found(policy_id));
        }
        Err(e) => {
            error!("Database error while fetching insurance policy: {}", e);
            return Err(database_error("Failed to retrieve insurance policy"));
        }
    };

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
    let premium = request.premium.unwrap_or(existing.premium);

    if let Err(e) = validate_definition(&frequency, due_day, due_months.as_ref(), premium) {
        warn!("Insurance policy validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

    let name = request.name.clone().unwrap_or_else(|| existing.name.clone());
    let start_date = request.start_date.unwrap_or(existing.start_date);

    let mut update_model: insurance_policy::ActiveModel = existing.into();
    if let Some(provider) = request.provider {
        update_model.provider = Set(provider);
    }
    update_model.name = Set(name.clone());
    update_model.frequency = Set(frequency.clone());
    update_model.due_day = Set(due_day);
    update_model.due_months = Set(due_months.clone());
    update_model.premium = Set(premium);
    update_model.start_date = Set(start_date);

    let policy = match update_model.update(&state.db).await {
        Ok(policy) => policy,
        Err(e) => {
            error!("Failed to update insurance policy: {}", e);
            return Err(database_error("Failed to update insurance policy"));
        }
    };

    // Keep the auto-linked schedule in step with the policy terms
    let sched = match find_linked_schedule(&state.db, schedule::LinkedKind::Insurance, policy.id)
        .await
    {
        Ok(Some(sched)) => {
            let mut sched_update: schedule::ActiveModel = sched.into();
            sched_update.name = Set(format!("{} premium", name));
            sched_update.frequency = Set(frequency);
            sched_update.due_day = Set(due_day);
            sched_update.due_months = Set(due_months);
            sched_update.amount = Set(premium);
            sched_update.start_date = Set(start_date);
            match sched_update.update(&state.db).await {
                Ok(sched) => Some(sched),
                Err(e) => {
                    error!("Failed to update premium schedule: {}", e);
                    return Err(database_error("Failed to update premium schedule"));
                }
            }
        }
        Ok(None) => {
            warn!("Insurance policy {} has no premium schedule", policy.id);
            None
        }
        Err(e) => {
            error!("Failed to load premium schedule: {}", e);
            return Err(database_error("Failed to load premium schedule"));
        }
    };

    info!("Successfully updated insurance policy with ID: {}", policy.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: InsurancePolicyResponse::from_model(policy, sched, reference_date(None)),
        message: "Insurance policy updated successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Delete an insurance policy
///
/// Deletes the auto-linked premium schedule (and, through the cascade,
/// its tracked instances) with it.
#[utoipa::path(
    delete,
    path = "/api/v1/insurance-policies/{policy_id}",
    tag = "insurance-policies",
    params(
        ("policy_id" = i32, Path, description = "Insurance policy ID"),
    ),
    responses(
        (status = 200, description = "Insurance policy deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Insurance policy not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_insurance_policy(
    Path(policy_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_insurance_policy function");
    debug!("Deleting insurance policy with ID: {}", policy_id);

    let policy = match insurance_policy::Entity::find_by_id(policy_id).one(&state.db).await {
        Ok(Some(policy)) => policy,
        Ok(None) => {
            warn!("Insurance policy with ID {} not found", policy_id);
            return Err(policy_not_found(policy_id));
        }
        Err(e) => {
            error!("Database error while fetching insurance policy: {}", e);
            return Err(database_error("Failed to retrieve insurance policy"));
        }
    };

    match find_linked_schedule(&state.db, schedule::LinkedKind::Insurance, policy.id).await {
        Ok(Some(sched)) => {
            if let Err(e) = sched.delete(&state.db).await {
                error!("Failed to delete premium schedule: {}", e);
                return Err(database_error("Failed to delete premium schedule"));
            }
        }
        Ok(None) => {
            warn!("Insurance policy {} has no premium schedule", policy.id);
        }
        Err(e) => {
            error!("Failed to load premium schedule: {}", e);
            return Err(database_error("Failed to load premium schedule"));
        }
    }

    match policy.delete(&state.db).await {
        Ok(_) => {
            info!("Successfully deleted insurance policy with ID: {}", policy_id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: format!("Insurance policy with id {} deleted successfully", policy_id),
                message: "Insurance policy deleted successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to delete insurance policy: {}", e);
            Err(database_error("Failed to delete insurance policy"))
        }
    }
}
