use crate::handlers::{
    family_members::{
        create_family_member, delete_family_member, get_family_member, get_family_members,
        update_family_member,
    },
    health::health_check,
    instances::{create_instance, get_schedule_instances, record_payment},
    insurance_policies::{
        create_insurance_policy, delete_insurance_policy, get_insurance_policies,
        get_insurance_policy, update_insurance_policy,
    },
    investments::{
        create_investment, delete_investment, get_investment, get_investments, update_investment,
    },
    loans::{create_loan, delete_loan, get_loan, get_loans, update_loan},
    schedules::{create_schedule, delete_schedule, get_schedule, get_schedules, update_schedule},
    summary::{get_month_summary, get_year_calendar},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Family member CRUD routes
        .route("/api/v1/family-members", post(create_family_member))
        .route("/api/v1/family-members", get(get_family_members))
        .route("/api/v1/family-members/:member_id", get(get_family_member))
        .route("/api/v1/family-members/:member_id", put(update_family_member))
        .route("/api/v1/family-members/:member_id", delete(delete_family_member))
        // Schedule CRUD routes
        .route("/api/v1/schedules", post(create_schedule))
        .route("/api/v1/schedules", get(get_schedules))
        .route("/api/v1/schedules/:schedule_id", get(get_schedule))
        .route("/api/v1/schedules/:schedule_id", put(update_schedule))
        .route("/api/v1/schedules/:schedule_id", delete(delete_schedule))
        // Instance routes
        .route("/api/v1/schedules/:schedule_id/instances", post(create_instance))
        .route("/api/v1/schedules/:schedule_id/instances", get(get_schedule_instances))
        .route("/api/v1/instances/:instance_id/payment", put(record_payment))
        // Summary and calendar views
        .route("/api/v1/schedules/summary", get(get_month_summary))
        .route("/api/v1/schedules/calendar/:year", get(get_year_calendar))
        // Insurance policy CRUD routes
        .route("/api/v1/insurance-policies", post(create_insurance_policy))
        .route("/api/v1/insurance-policies", get(get_insurance_policies))
        .route("/api/v1/insurance-policies/:policy_id", get(get_insurance_policy))
        .route("/api/v1/insurance-policies/:policy_id", put(update_insurance_policy))
        .route("/api/v1/insurance-policies/:policy_id", delete(delete_insurance_policy))
        // Loan CRUD routes
        .route("/api/v1/loans", post(create_loan))
        .route("/api/v1/loans", get(get_loans))
        .route("/api/v1/loans/:loan_id", get(get_loan))
        .route("/api/v1/loans/:loan_id", put(update_loan))
        .route("/api/v1/loans/:loan_id", delete(delete_loan))
        // Investment CRUD routes
        .route("/api/v1/investments", post(create_investment))
        .route("/api/v1/investments", get(get_investments))
        .route("/api/v1/investments/:investment_id", get(get_investment))
        .route("/api/v1/investments/:investment_id", put(update_investment))
        .route("/api/v1/investments/:investment_id", delete(delete_investment))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
