use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use super::family_member;

/// How often a schedule recurs.
///
/// `Monthly` recurs in every month on `due_day`; the fixed frequencies
/// map to hardcoded month sets (`Quarterly` -> Jan/Apr/Jul/Oct,
/// `HalfYearly` -> Jan/Jul); `Yearly` and `Custom` use the schedule's
/// own `due_months`.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Frequency {
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Quarterly")]
    Quarterly,
    #[sea_orm(string_value = "HalfYearly")]
    HalfYearly,
    #[sea_orm(string_value = "Yearly")]
    Yearly,
    #[sea_orm(string_value = "Custom")]
    Custom,
}

/// Kind of source entity an auto-linked schedule is derived from.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum LinkedKind {
    #[sea_orm(string_value = "Insurance")]
    Insurance,
    #[sea_orm(string_value = "Loan")]
    Loan,
    #[sea_orm(string_value = "Investment")]
    Investment,
}

/// Explicit due-month set for `Yearly`/`Custom` schedules, stored as a
/// JSON array. Kept sorted ascending with values in 1..=12.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct DueMonths(pub Vec<u32>);

impl DueMonths {
    /// Sorts and deduplicates on construction so the stored form always
    /// satisfies the ascending invariant.
    pub fn new(mut months: Vec<u32>) -> Self {
        months.sort_unstable();
        months.dedup();
        Self(months)
    }

    pub fn contains(&self, month: u32) -> bool {
        self.0.binary_search(&month).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A recurring-payment template ("Property Tax", "Car Insurance", ...).
/// Concrete occurrences are either synthesized per month by the
/// projector or persisted as `schedule_instance` rows once acted upon.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// The frequency of the schedule.
    pub frequency: Frequency,
    /// Day of month the payment is due, 1..=31. Clamped to the last
    /// valid day of shorter months when occurrences are resolved.
    pub due_day: i32,
    /// Explicit month set for `Yearly`/`Custom`; null for the others.
    #[sea_orm(column_type = "Json", nullable)]
    pub due_months: Option<DueMonths>,
    /// No occurrence is considered active before this date.
    pub start_date: NaiveDate,
    /// Expected amount of each occurrence. Always positive.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// True when this schedule is derived from another entity and must
    /// not be independently edited or deleted.
    #[sea_orm(default_value = "false")]
    pub is_auto_linked: bool,
    pub linked_kind: Option<LinkedKind>,
    /// Id of the source row in the table `linked_kind` points at.
    pub linked_id: Option<i32>,
    pub family_member_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "family_member::Entity",
        from = "Column::FamilyMemberId",
        to = "family_member::Column::Id",
        on_delete = "Cascade"
    )]
    FamilyMember,
    #[sea_orm(has_many = "super::schedule_instance::Entity")]
    Instance,
}

impl Related<family_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FamilyMember.def()
    }
}

impl Related<super::schedule_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Instance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
