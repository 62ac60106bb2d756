use common::MonthSummary;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for computed month/calendar projections
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Summary(MonthSummary),
    Calendar(Vec<MonthSummary>),
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::family_members::create_family_member,
        crate::handlers::family_members::get_family_members,
        crate::handlers::family_members::get_family_member,
        crate::handlers::family_members::update_family_member,
        crate::handlers::family_members::delete_family_member,
        crate::handlers::schedules::create_schedule,
        crate::handlers::schedules::get_schedules,
        crate::handlers::schedules::get_schedule,
        crate::handlers::schedules::update_schedule,
        crate::handlers::schedules::delete_schedule,
        crate::handlers::instances::create_instance,
        crate::handlers::instances::get_schedule_instances,
        crate::handlers::instances::record_payment,
        crate::handlers::summary::get_month_summary,
        crate::handlers::summary::get_year_calendar,
        crate::handlers::insurance_policies::create_insurance_policy,
        crate::handlers::insurance_policies::get_insurance_policies,
        crate::handlers::insurance_policies::get_insurance_policy,
        crate::handlers::insurance_policies::update_insurance_policy,
        crate::handlers::insurance_policies::delete_insurance_policy,
        crate::handlers::loans::create_loan,
        crate::handlers::loans::get_loans,
        crate::handlers::loans::get_loan,
        crate::handlers::loans::update_loan,
        crate::handlers::loans::delete_loan,
        crate::handlers::investments::create_investment,
        crate::handlers::investments::get_investments,
        crate::handlers::investments::get_investment,
        crate::handlers::investments::update_investment,
        crate::handlers::investments::delete_investment,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            common::MonthSummary,
            common::ScheduledItem,
            common::PaymentState,
            common::DueStatus,
            crate::handlers::family_members::CreateFamilyMemberRequest,
            crate::handlers::family_members::UpdateFamilyMemberRequest,
            crate::handlers::family_members::FamilyMemberResponse,
            crate::handlers::schedules::CreateScheduleRequest,
            crate::handlers::schedules::UpdateScheduleRequest,
            crate::handlers::schedules::ScheduleResponse,
            crate::handlers::instances::CreateInstanceRequest,
            crate::handlers::instances::RecordPaymentRequest,
            crate::handlers::instances::InstanceResponse,
            crate::handlers::insurance_policies::CreateInsurancePolicyRequest,
            crate::handlers::insurance_policies::UpdateInsurancePolicyRequest,
            crate::handlers::insurance_policies::InsurancePolicyResponse,
            crate::handlers::loans::CreateLoanRequest,
            crate::handlers::loans::UpdateLoanRequest,
            crate::handlers::loans::LoanResponse,
            crate::handlers::investments::CreateInvestmentRequest,
            crate::handlers::investments::UpdateInvestmentRequest,
            crate::handlers::investments::InvestmentResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "family-members", description = "Family member CRUD endpoints"),
        (name = "schedules", description = "Recurring payment schedule endpoints"),
        (name = "instances", description = "Schedule instance and payment endpoints"),
        (name = "summary", description = "Monthly tracker and annual calendar endpoints"),
        (name = "insurance-policies", description = "Insurance policy endpoints"),
        (name = "loans", description = "Loan endpoints"),
        (name = "investments", description = "Investment endpoints"),
    ),
    info(
        title = "FamLedger API",
        description = "Family finance tracker API - recurring payment schedules, instances and month summaries",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
