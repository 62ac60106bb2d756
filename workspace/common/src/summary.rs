use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Effective payment state of a scheduled occurrence as reported to
/// clients. The database only persists `Pending`/`Paid`; `Overdue` is
/// derived at read time from the due date and the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentState {
    Pending,
    Paid,
    Overdue,
}

/// Classification of a schedule's next occurrence relative to a
/// reference date, used by list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
}

/// One scheduled occurrence within a month view. Synthesized from the
/// schedule definition unless a persisted instance exists for the same
/// (schedule, due date), in which case the instance's amount and paid
/// fields win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduledItem {
    /// The defining schedule.
    pub schedule_id: i32,
    /// Name copied from the definition for display.
    pub schedule_name: String,
    /// Persisted instance backing this item, if one exists.
    pub instance_id: Option<i32>,
    /// Concrete due date for this occurrence (day clamped to the month).
    pub due_date: NaiveDate,
    /// Expected amount for this occurrence.
    pub amount: Decimal,
    /// Effective state relative to the aggregation's reference date.
    pub state: PaymentState,
    /// Actual amount paid, when paid.
    pub paid_amount: Option<Decimal>,
    /// Date the payment was recorded, when paid.
    pub paid_date: Option<NaiveDate>,
    /// Whether the defining schedule is derived from another entity.
    pub auto_linked: bool,
}

/// Aggregated view of all scheduled payments falling in one month.
///
/// `pending_amount` sums every non-paid item, overdue included —
/// `overdue_amount` is the separately-reported subset of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthSummary {
    pub year: i32,
    /// Month number, 1 = January.
    pub month: u32,
    pub items: Vec<ScheduledItem>,
    /// Sum of all item amounts, paid or not.
    pub total_amount: Decimal,
    /// Sum over paid items (paid amount when recorded, else expected).
    pub paid_amount: Decimal,
    /// Sum over all non-paid items.
    pub pending_amount: Decimal,
    /// Sum over non-paid items whose due date has passed.
    pub overdue_amount: Decimal,
}

impl MonthSummary {
    /// An empty summary for a period with no matching schedules.
    pub fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            pending_amount: Decimal::ZERO,
            overdue_amount: Decimal::ZERO,
        }
    }
}
