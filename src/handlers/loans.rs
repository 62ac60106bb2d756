use crate::handlers::schedules::ScheduleResponse;
use crate::handlers::{find_linked_schedule, reference_date};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::{family_member, loan, schedule};
use projector::validate_definition;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a loan
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateLoanRequest {
    pub name: String,
    pub lender: String,
    /// Original principal, informational only
    pub principal: Decimal,
    /// Monthly installment amount (must be positive)
    pub emi_amount: Decimal,
    /// Day of month the installment is due (1-31)
    pub emi_day: i32,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
}

/// Request body for updating a loan
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateLoanRequest {
    pub name: Option<String>,
    pub lender: Option<String>,
    pub principal: Option<Decimal>,
    pub emi_amount: Option<Decimal>,
    pub emi_day: Option<i32>,
    pub start_date: Option<NaiveDate>,
}

/// Loan response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanResponse {
    pub id: i32,
    pub name: String,
    pub lender: String,
    pub principal: Decimal,
    pub emi_amount: Decimal,
    pub emi_day: i32,
    pub start_date: NaiveDate,
    pub family_member_id: i32,
    /// The monthly EMI schedule maintained for this loan
    pub emi_schedule: Option<ScheduleResponse>,
}

impl LoanResponse {
    fn from_model(
        model: loan::Model,
        emi_schedule: Option<schedule::Model>,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            lender: model.lender,
            principal: model.principal,
            emi_amount: model.emi_amount,
            emi_day: model.emi_day,
            start_date: model.start_date,
            family_member_id: model.family_member_id,
            emi_schedule: emi_schedule.map(|s| ScheduleResponse::from_model(s, as_of)),
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

fn loan_not_found(loan_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Loan with id {} does not exist", loan_id),
            code: "LOAN_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// Create a new loan
///
/// Also creates the auto-linked monthly EMI schedule.
#[utoipa::path(
    post,
    path = "/api/v1/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created successfully", body = ApiResponse<LoanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_loan function");
    debug!("Creating loan: {}", request.name);

    if let Err(e) = validate_definition(
        &schedule::Frequency::Monthly,
        request.emi_day,
        None,
        request.emi_amount,
    ) {
        warn!("Loan validation failed: {}", e);
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

    let new_loan = loan::ActiveModel {
        name: Set(request.name.clone()),
        lender: Set(request.lender),
        principal: Set(request.principal),
        emi_amount: Set(request.emi_amount),
        emi_day: Set(request.emi_day),
        start_date: Set(request.start_date),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let loan_model = match new_loan.insert(&state.db).await {
        Ok(loan_model) => loan_model,
        Err(e) => {
            error!("Failed to create loan: {}", e);
            return Err(database_error("Failed to create loan"));
        }
    };

    let emi_schedule = schedule::ActiveModel {
        name: Set(format!("{} EMI", request.name)),
        description: Set(Some(format!("Installment for loan '{}'", request.name))),
        frequency: Set(schedule::Frequency::Monthly),
        due_day: Set(request.emi_day),
        due_months: Set(None),
        start_date: Set(request.start_date),
        amount: Set(request.emi_amount),
        is_auto_linked: Set(true),
        linked_kind: Set(Some(schedule::LinkedKind::Loan)),
        linked_id: Set(Some(loan_model.id)),
        family_member_id: Set(request.family_member_id),
        ..Default::default()
    };

    let sched = match emi_schedule.insert(&state.db).await {
        Ok(sched) => sched,
        Err(e) => {
            error!("Failed to create EMI schedule: {}", e);
            return Err(database_error("Failed to create EMI schedule"));
        }
    };

    info!("Successfully created loan with ID: {}", loan_model.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: LoanResponse::from_model(loan_model, Some(sched), reference_date(None)),
        message: "Loan created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get all loans
#[utoipa::path(
    get,
    path = "/api/v1/loans",
    tag = "loans",
    responses(
        (status = 200, description = "Loans retrieved successfully", body = ApiResponse<Vec<LoanResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_loans(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<LoanResponse>>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_loans function");
    debug!("Fetching all loans");

    let as_of = reference_date(None);
    match loan::Entity::find().all(&state.db).await {
        Ok(loans) => {
            info!("Successfully retrieved {} loans", loans.len());
            let mut response_data = Vec::with_capacity(loans.len());
            for loan_model in loans {
                let sched = find_linked_schedule(&state.db, schedule::LinkedKind::Loan, loan_model.id)
                    .await
                    .map_err(|e| {
                        error!("Failed to load EMI schedule: {}", e);
                        database_error("Failed to load EMI schedule")
                    })?;
                response_data.push(LoanResponse::from_model(loan_model, sched, as_of));
            }

            let response = ApiResponse {
                data: response_data,
                message: "Loans retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to retrieve loans: {}", e);
            Err(database_error("Failed to retrieve loans"))
        }
    }
}

/// Get a specific loan by ID
#[utoipa::path(
    get,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    params(
        ("loan_id" = i32, Path, description = "Loan ID"),
    ),
    responses(
        (status = 200, description = "Loan retrieved successfully", body = ApiResponse<LoanResponse>),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_loan(
    Path(loan_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<LoanResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_loan function");
    debug!("Fetching loan with ID: {}", loan_id);

    match loan::Entity::find_by_id(loan_id).one(&state.db).await {
        Ok(Some(loan_model)) => {
            let sched = find_linked_schedule(&state.db, schedule::LinkedKind::Loan, loan_model.id)
                .await
                .map_err(|e| {
                    error!("Failed to load EMI schedule: {}", e);
                    database_error("Failed to load EMI schedule")
                })?;
            info!("Successfully retrieved loan: {}", loan_model.name);
            let response = ApiResponse {
                data: LoanResponse::from_model(loan_model, sched, reference_date(None)),
                message: "Loan retrieved successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Ok(None) => {
            warn!("Loan with ID {} not found", loan_id);
            Err(loan_not_found(loan_id))
        }
        Err(e) => {
            error!("Database error while fetching loan: {}", e);
            Err(database_error("Failed to retrieve loan"))
        }
    }
}

/// Update a loan
///
/// Changed EMI terms are propagated to the auto-linked schedule.
#[utoipa::path(
    put,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    params(
        ("loan_id" = i32, Path, description = "Loan ID"),
    ),
    request_body = UpdateLoanRequest,
    responses(
        (status = 200, description = "Loan updated successfully", body = ApiResponse<LoanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_loan(
    Path(loan_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanResponse>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_loan function");
    debug!("Updating loan with ID: {}", loan_id);

    let existing = match loan::Entity::find_by_id(loan_id).one(&state.db).await {
        Ok(Some(loan_model)) => loan_model,
        Ok(None) => {
            warn!("Loan with ID {} not found", loan_id);
            return Err(loan_not_found(loan_id));
        }
        Err(e) => {
            error!("Database error while fetching loan: {}", e);
            return Err(database_error("Failed to retrieve loan"));
        }
    };

    let emi_day = request.emi_day.unwrap_or(existing.emi_day);
    let emi_amount = request.emi_amount.unwrap_or(existing.emi_amount);
    if let Err(e) = validate_definition(&schedule::Frequency::Monthly, emi_day, None, emi_amount) {
        warn!("Loan validation failed: {}", e);
        return Err(validation_error(e.to_string()));
    }

    let name = request.name.clone().unwrap_or_else(|| existing.name.clone());
    let start_date = request.start_date.unwrap_or(existing.start_date);

    let mut update_model: loan::ActiveModel = existing.into();
    if let Some(lender) = request.lender {
        update_model.lender = Set(lender);
    }
    if let Some(principal) = request.principal {
        update_model.principal = Set(principal);
    }
    update_model.name = Set(name.clone());
    update_model.emi_amount = Set(emi_amount);
    update_model.emi_day = Set(emi_day);
    update_model.start_date = Set(start_date);

    let loan_model = match update_model.update(&state.db).await {
        Ok(loan_model) => loan_model,
        Err(e) => {
            error!("Failed to update loan: {}", e);
            return Err(database_error("Failed to update loan"));
        }
    };

    let sched = match find_linked_schedule(&state.db, schedule::LinkedKind::Loan, loan_model.id)
        .await
    {
        Ok(Some(sched)) => {
            let mut sched_update: schedule::ActiveModel = sched.into();
            sched_update.name = Set(format!("{} EMI", name));
            sched_update.due_day = Set(emi_day);
            sched_update.amount = Set(emi_amount);
            sched_update.start_date = Set(start_date);
            match sched_update.update(&state.db).await {
                Ok(sched) => Some(sched),
                Err(e) => {
                    error!("Failed to update EMI schedule: {}", e);
                    return Err(database_error("Failed to update EMI schedule"));
                }
            }
        }
        Ok(None) => {
            warn!("Loan {} has no EMI schedule", loan_model.id);
            None
        }
        Err(e) => {
            error!("Failed to load EMI schedule: {}", e);
            return Err(database_error("Failed to load EMI schedule"));
        }
    };

    info!("Successfully updated loan with ID: {}", loan_model.id);
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: LoanResponse::from_model(loan_model, sched, reference_date(None)),
        message: "Loan updated successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Delete a loan together with its auto-linked EMI schedule
#[utoipa::path(
    delete,
    path = "/api/v1/loans/{loan_id}",
    tag = "loans",
    params(
        ("loan_id" = i32, Path, description = "Loan ID"),
    ),
    responses(
        (status = 200, description = "Loan deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_loan(
    Path(loan_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_loan function");
    debug!("Deleting loan with ID: {}", loan_id);

    let loan_model = match loan::Entity::find_by_id(loan_id).one(&state.db).await {
        Ok(Some(loan_model)) => loan_model,
        Ok(None) => {
            warn!("Loan with ID {} not found", loan_id);
            return Err(loan_not_found(loan_id));
        }
        Err(e) => {
            error!("Database error while fetching loan: {}", e);
            return Err(database_error("Failed to retrieve loan"));
        }
    };

    match find_linked_schedule(&state.db, schedule::LinkedKind::Loan, loan_model.id).await {
        Ok(Some(sched)) => {
            if let Err(e) = sched.delete(&state.db).await {
                error!("Failed to delete EMI schedule: {}", e);
                return Err(database_error("Failed to delete EMI schedule"));
            }
        }
        Ok(None) => {
            warn!("Loan {} has no EMI schedule", loan_model.id);
        }
        Err(e) => {
            error!("Failed to load EMI schedule: {}", e);
            return Err(database_error("Failed to load EMI schedule"));
        }
    }

    match loan_model.delete(&state.db).await {
        Ok(_) => {
            info!("Successfully deleted loan with ID: {}", loan_id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: format!("Loan with id {} deleted successfully", loan_id),
                message: "Loan deleted successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::OK, Json(response)))
        }
        Err(e) => {
            error!("Failed to delete loan: {}", e);
            Err(database_error("Failed to delete loan"))
        }
    }
}
