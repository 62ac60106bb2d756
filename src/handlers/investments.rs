use crate::handlers::schedules::ScheduleResponse;
use crate::handlers::{find_linked_schedule, reference_date};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{family_member, investment, schedule};
use projector::validate_definition;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating an investment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateInvestmentRequest {
    pub name: String,
    /// Free-form kind label ("mutual fund", "ppf", ...)
    pub kind: Option<String>,
    /// Monthly SIP contribution amount (must be positive)
    pub sip_amount: Decimal,
    /// Day of month the contribution is due (1-31)
    pub sip_day: i32,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
}

/// Request body for updating an investment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateInvestmentRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub sip_amount: Option<Decimal>,
    pub sip_day: Option<i32>,
    pub start_date: Option<NaiveDate>,
}

/// Investment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvestmentResponse {
    pub id: i32,
    pub name: String,
    pub kind: Option<String>,
    pub sip_amount: Decimal,
    pub sip_day: i32,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
    /// The monthly SIP schedule maintained for this investment
    pub sip_schedule: Option<ScheduleResponse>,
}

impl InvestmentResponse {
    fn from_model(
        model: investment::Model,
        sip_schedule: Option<schedule::Model>,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            kind: model.kind,
            sip_amount: model.sip_amount,
            sip_day: model.sip_day,
            start_date: model.start_date,
            family_member_id: model.family_member_id,
            sip_schedule: sip_schedule.map(|s| ScheduleResponse::from_model(s, as_of)),
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

fn investment_not_found(investment_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Investment with id {} does not exist", investment_id),
            code: "INVESTMENT_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Create a new investment
///
/// Also creates the auto-linked monthly SIP schedule.
#[utoipa::path(
    post,
    path = "/api/v1/investments",
    tag = "investments",
    request_body = CreateInvestmentRequest,
    responses(
        (status = 201, description = "Investment created successfully", body = ApiResponse<InvestmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_investment(
    State(state): State<AppState>,
    Json(request): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvestmentResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_investment function");
    debug!("Creating investment: {}", request.name);

    if let Err(e) = validate_definition(
        &schedule::Frequency::Monthly,
        request.sip_day,
        None,
        request.sip_amount,
    ) {
        warn!("Investment validation failed: {}", e);
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

    let new_investment = investment::ActiveModel {
        name: Set(request.name.clone()),
        kind: Set(request.kind),
        sip_amount: Set(request.sip_amount),
        sip_day: Set(request.sip_day),
        start_date: Set(request.start_date),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let investment_model = match new_investment.insert(&state.db).await {
        Ok(investment_model) => investment_model,
        Err(e) => {
            error!("Failed to create investment: {}", e);
            return Err(database_error("Failed to create investment"));
        }
    };

    let sip_schedule = schedule::ActiveModel {
        name: Set(format!("{} SIP", request.name)),
        description: Set(Some(format!("Contribution for investment '{}'", request.name))),
        frequency: Set(schedule::Frequency::Monthly),
        due_day: Set(request.sip_day),
        due_months: Set(None),
        start_date: Set(request.start_date),
        amount: Set(request.sip_amount),
        is_auto_linked: Set(true),
        linked_kind: Set(Some(schedule::LinkedKind::Investment)),
        linked_id: Set(Some(investment_model.id)),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let sched = match sip_schedule.insert(&state.db).await {
        Ok(sched) => sched,
        Err(e) => {
            error!("Failed to create SIP schedule: {}", e);
            return Err(database_error("Failed to create SIP schedule"));
        }
    };

    info!("Successfully created investment with ID: {}", investment_model.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: InvestmentResponse::from_model(investment_model, Some(sched), reference_date(None)),
        message: "Investment created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all investments
#[utoipa::path(
    get,
    path = "/api/v1/investments",
    tag = "investments",
    responses(
        (status = 200, description = "Investments retrieved successfully", body = ApiResponse<Vec<InvestmentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_investments(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<InvestmentResponse>>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering get_investments function");
    debug!("Fetching all investments");

    let as_of = reference_date(None);
    match investment::Entity::find().all(&state.db).await {
        Ok(investments) => {
            info!("Successfully retrieved {} investments", investments.len());
            let mut response_data = Vec::with_capacity(investments.len());
            for investment_model in investments {
                let sched = find_linked_schedule(
                    &state.db,
                    schedule::LinkedKind::Investment,
                    investment_model.id,
                )
                .await
                .map_err(|e| {
                    error!("Failed to load SIP schedule: {}", e);
                    database_error("Failed to load SIP schedule")
                })?;
                response_data.push(InvestmentResponse::from_model(investment_model, sched, as_of));
            }

            let response = ApiResponse {
                data: response_data,
                message: "Investments retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to retrieve investments: {}", e);
            Err(database_error("Failed to retrieve investments"))
        }
    }
}

/// Get a specific investment by ID
#[utoipa::path(
    get,
    path = "/api/v1/investments/{investment_id}",
    tag = "investments",
    params(
        ("investment_id" = i32, Path, description = "Investment ID"),
    ),
    responses(
        (status = 200, description = "Investment retrieved successfully", body = ApiResponse<InvestmentResponse>),
        (status = 404, description = "Investment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_investment(
    Path(investment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<InvestmentResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering get_investment function");
    debug!("Fetching investment with ID: {}", investment_id);

    match investment::Entity::find_by_id(investment_id).one(&state.db).await {
        Ok(Some(investment_model)) => {
            let sched = find_linked_schedule(
                &state.db,
                schedule::LinkedKind::Investment,
                investment_model.id,
            )
            .await
            .map_err(|e| {
                error!("Failed to load SIP schedule: {}", e);
                database_error("Failed to load SIP schedule")
            })?;
            info!("Successfully retrieved investment: {}", investment_model.name);
            let response = ApiResponse {
                data: InvestmentResponse::from_model(investment_model, sched, reference_date(None)),
                message: "Investment retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Ok(None) => {
            warn!("Investment with ID {} not found", investment_id);
            Err(investment_not_found(investment_id))
        }
        Err(e) => {
            error!("Database error while fetching investment: {}", e);
            Err(database_error("Failed to retrieve investment"))
        }
    }
}

/// Update an investment
///
/// Changed SIP terms are propagated to the auto-linked schedule.
#[utoipa::path(
    put,
    path = "/api/v1/investments/{investment_id}",
    tag = "investments",
    params(
        ("investment_id" = i32, Path, description = "Investment ID"),
    ),
    request_body = UpdateInvestmentRequest,
    responses(
        (status = 200, description = "Investment updated successfully", body = ApiResponse<InvestmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_investment(
    Path(investment_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateInvestmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvestmentResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering update_investment function");
    debug!("Updating investment with ID: {}", investment_id);

    let existing = match investment::Entity::find_by_id(investment_id).one(&state.db).await {
        Ok(Some(investment_model)) => investment_model,
        Ok(None) => {
            warn!("Investment with ID {} not found", investment_id);
            return Err(investment_not_found(investment_id));
        }
        Err(e) => {
            error!("Database error while fetching investment: {}", e);
            return Err(database_error("Failed to retrieve investment"));
        }
    };

    let sip_day = request.sip_day.unwrap_or(existing.sip_day);
    let sip_amount = request.sip_amount.unwrap_or(existing.sip_amount);
    if let Err(e) = validate_definition(&schedule::Frequency::Monthly, sip_day, None, sip_amount) {
        warn!("Investment validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

    let name = request.name.clone().unwrap_or_else(|| existing.name.clone());
    let start_date = request.start_date.unwrap_or(existing.start_date);

    let mut update_model: investment::ActiveModel = existing.into();
    if let Some(kind) = request.kind {
        update_model.kind = Set(Some(kind));
    }
    update_model.name = Set(name.clone());
    update_model.sip_amount = Set(sip_amount);
    update_model.sip_day = Set(sip_day);
    update_model.start_date = Set(start_date);

    let investment_model = match update_model.update(&state.db).await {
        Ok(investment_model) => investment_model,
        Err(e) => {
            error!("Failed to update investment: {}", e);
            return Err(database_error("Failed to update investment"));
        }
    };

    let sched = match find_linked_schedule(
        &state.db,
        schedule::LinkedKind::Investment,
        investment_model.id,
    )
    .await
    {
        Ok(Some(sched)) => {
            let mut sched_update: schedule::ActiveModel = sched.into();
            sched_update.name = Set(format!("{} SIP", name));
            sched_update.due_day = Set(sip_day);
            sched_update.amount = Set(sip_amount);
            sched_update.start_date = Set(start_date);
            match sched_update.update(&state.db).await {
                Ok(sched) => Some(sched),
                Err(e) => {
                    error!("Failed to update SIP schedule: {}", e);
                    return Err(database_error("Failed to update SIP schedule"));
                }
            }
        }
        Ok(None) => {
            warn!("Investment {} has no SIP schedule", investment_model.id);
            None
        }
        Err(e) => {
            error!("Failed to load SIP schedule: {}", e);
            return Err(database_error("Failed to load SIP schedule"));
        }
    };

    info!("Successfully updated investment with ID: {}", investment_model.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: InvestmentResponse::from_model(investment_model, sched, reference_date(None)),
        message: "Investment updated successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Delete an investment together with its auto-linked SIP schedule
#[utoipa::path(
    delete,
    path = "/api/v1/investments/{investment_id}",
    tag = "investments",
    params(
        ("investment_id" = i32, Path, description = "Investment ID"),
    ),
    responses(
        (status = 200, description = "Investment deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Investment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_investment(
    Path(investment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_investment function");
    debug!("Deleting investment with ID: {}", investment_id);

    let investment_model = match investment::Entity::find_by_id(investment_id).one(&state.db).await
    {
        Ok(Some(investment_model)) => investment_model,
        Ok(None) => {
            warn!("Investment with ID {} not found", investment_id);
            return Err(investment_not_found(investment_id));
        }
        Err(e) => {
            error!("Database error while fetching investment: {}", e);
            return Err(database_error("Failed to retrieve investment"));
        }
    };

    match find_linked_schedule(&state.db, schedule::LinkedKind::Investment, investment_model.id)
        .await
    {
        Ok(Some(sched)) => {
            if let Err(e) = sched.delete(&state.db).await {
                error!("Failed to delete SIP schedule: {}", e);
                return Err(database_error("Failed to delete SIP schedule"));
            }
        }
        Ok(None) => {
            warn!("Investment {} has no SIP schedule", investment_model.id);
        }
        Err(e) => {
            error!("Failed to load SIP schedule: {}", e);
            return Err(database_error("Failed to load SIP schedule"));
        }
    }

    match investment_model.delete(&state.db).await {
        Ok(_) => {
            info!("Successfully deleted investment with ID: {}", investment_id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: format!("Investment with id {} deleted successfully", investment_id),
                message: "Investment deleted successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to delete investment: {}", e);
            Err(database_error("Failed to delete investment"))
        }
    }
}
