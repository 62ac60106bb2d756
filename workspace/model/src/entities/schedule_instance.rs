use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::schedule;

/// Persisted status of an instance. Overdue is never stored; it is
/// derived at read time from `due_date` and the reference date, so the
/// invariant "overdue iff due date passed and not paid" holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum InstanceStatus {
    #[sea_orm(string_value = "Pending")]
    Pending, // Expected but not yet paid.
    #[sea_orm(string_value = "Paid")]
    Paid, // Payment recorded. Terminal; there is no unpay.
}

/// One concrete occurrence of a schedule ("June rent"). Created lazily
/// when the user acts on a synthesized occurrence, usually to pay it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "schedule_instances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The schedule that generated this instance.
    pub schedule_id: i32,

    pub status: InstanceStatus,

    /// The date this occurrence was scheduled for. At most one instance
    /// exists per (schedule_id, due_date).
    pub due_date: NaiveDate,

    /// Amount copied from the definition at creation time. Later edits
    /// of the definition do not rewrite existing instances.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub expected_amount: Decimal,

    /// The date the payment was recorded (set together with status).
    pub paid_date: Option<NaiveDate>,

    /// The actual amount paid.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "schedule::Entity",
        from = "Column::ScheduleId",
        to = "schedule::Column::Id",
        on_delete = "Cascade"
    )]
    Schedule,
}

impl Related<schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
