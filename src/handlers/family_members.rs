use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::family_member;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new family member
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateFamilyMemberRequest {
    /// Member name (must be unique)
    pub name: String,
    /// Relationship label ("self", "spouse", "parent", ...)
    pub relationship: Option<String>,
}

/// Request body for updating a family member
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateFamilyMemberRequest {
    pub name: Option<String>,
    pub relationship: Option<String>,
}

/// Family member response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FamilyMemberResponse {
    pub id: i32,
    pub name: String,
    pub relationship: Option<String>,
}

impl From<family_member::Model> for FamilyMemberResponse {
    fn from(model: family_member::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            relationship: model.relationship,
        }
    }
}

/// Create a new family member
#[utoipa::path(
    post,
    path = "/api/v1/family-members",
    tag = "family-members",
    request_body = CreateFamilyMemberRequest,
    responses(
        (status = 201, description = "Family member created successfully", body = ApiResponse<FamilyMemberResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_family_member(
    State(state): State<AppState>,
    Json(request): Json<CreateFamilyMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FamilyMemberResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    trace!("Entering create_family_member function");
    debug!("Creating family member with name: {}", request.name);

    let new_member = family_member::ActiveModel {
        name: Set(request.name.clone()),
        relationship: Set(request.relationship),
        ..Default::default()
    };

    match new_member.insert(&state.db).await {
        Ok(member) => {
            info!("Family member created successfully with ID: {}", member.id);
            let response = ApiResponse {
                data: FamilyMemberResponse::from(member),
                message: "Family member created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create family member '{}': {}", request.name, db_error);

            let error_response = match db_error {
                DbErr::Exec(ref exec_err) => {
                    let error_msg = exec_err.to_string().to_lowercase();
                    if error_msg.contains("unique") || error_msg.contains("constraint") {
                        ErrorResponse {
                            error: format!("Family member '{}' already exists", request.name),
                            code: "FAMILY_MEMBER_ALREADY_EXISTS".to_string(),
                            success: false,
                        }
                    } else {
                        ErrorResponse {
                            error: "Failed to create family member due to database constraint"
                                .to_string(),
                            code: "DATABASE_CONSTRAINT_ERROR".to_string(),
                            success: false,
                        }
                    }
                }
                _ => ErrorResponse {
                    error: "Internal server error while creating family member".to_string(),
                    code: "DATABASE_ERROR".to_string(),
                    success: false,
                },
            };

            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)))
        }
    }
}

/// Get all family members
#[utoipa::path(
    get,
    path = "/api/v1/family-members",
    tag = "family-members",
    responses(
        (status = 200, description = "Family members retrieved successfully", body = ApiResponse<Vec<FamilyMemberResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_family_members(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FamilyMemberResponse>>>, StatusCode> {
    trace!("Entering get_family_members function");

    match family_member::Entity::find().all(&state.db).await {
        Ok(members) => {
            debug!("Retrieved {} family members from database", members.len());
            let responses: Vec<FamilyMemberResponse> =
                members.into_iter().map(FamilyMemberResponse::from).collect();

            let response = ApiResponse {
                data: responses,
                message: "Family members retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve family members: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific family member by ID
#[utoipa::path(
    get,
    path = "/api/v1/family-members/{member_id}",
    tag = "family-members",
    params(
        ("member_id" = i32, Path, description = "Family member ID"),
    ),
    responses(
        (status = 200, description = "Family member retrieved successfully", body = ApiResponse<FamilyMemberResponse>),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_family_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FamilyMemberResponse>>, StatusCode> {
    trace!("Entering get_family_member function for member_id: {}", member_id);

    match family_member::Entity::find_by_id(member_id).one(&state.db).await {
        Ok(Some(member)) => {
            info!("Successfully retrieved family member: {}", member.name);
            let response = ApiResponse {
                data: FamilyMemberResponse::from(member),
                message: "Family member retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Family member with ID {} not found", member_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve family member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update a family member
#[utoipa::path(
    put,
    path = "/api/v1/family-members/{member_id}",
    tag = "family-members",
    params(
        ("member_id" = i32, Path, description = "Family member ID"),
    ),
    request_body = UpdateFamilyMemberRequest,
    responses(
        (status = 200, description = "Family member updated successfully", body = ApiResponse<FamilyMemberResponse>),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_family_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateFamilyMemberRequest>,
) -> Result<Json<ApiResponse<FamilyMemberResponse>>, StatusCode> {
    trace!("Entering update_family_member function for member_id: {}", member_id);

    let existing = match family_member::Entity::find_by_id(member_id).one(&state.db).await {
        Ok(Some(member)) => member,
        Ok(None) => {
            warn!("Family member with ID {} not found for update", member_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to lookup family member {} for update: {}", member_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut member_active: family_member::ActiveModel = existing.into();

    if let Some(name) = request.name {
        debug!("Updating name to: {}", name);
        member_active.name = Set(name);
    }
    if let Some(relationship) = request.relationship {
        member_active.relationship = Set(Some(relationship));
    }

    match member_active.update(&state.db).await {
        Ok(updated) => {
            info!("Family member with ID {} updated successfully", member_id);
            let response = ApiResponse {
                data: FamilyMemberResponse::from(updated),
                message: "Family member updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update family member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a family member
#[utoipa::path(
    delete,
    path = "/api/v1/family-members/{member_id}",
    tag = "family-members",
    params(
        ("member_id" = i32, Path, description = "Family member ID"),
    ),
    responses(
        (status = 200, description = "Family member deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Family member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_family_member(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_family_member function for member_id: {}", member_id);

    match family_member::Entity::delete_by_id(member_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Family member with ID {} deleted successfully", member_id);
                // Schedules and sources cascade away with the member.
                state.cache.invalidate_all();
                let response = ApiResponse {
                    data: format!("Family member {} deleted", member_id),
                    message: "Family member deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Family member with ID {} not found for deletion", member_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete family member {}: {}", member_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
