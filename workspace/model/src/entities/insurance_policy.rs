use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::family_member;
use super::schedule::{DueMonths, Frequency};

/// An insurance policy whose premium payments materialize as an
/// auto-linked schedule.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "insurance_policies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub provider: String,
    /// Premium amount per due occurrence.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub premium: Decimal,
    /// Premium recurrence; reuses the schedule frequency enum.
    pub frequency: Frequency,
    pub due_day: i32,
    #[sea_orm(column_type = "Json", nullable)]
    pub due_months: Option<DueMonths>,
    pub start_date: NaiveDate,
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
}

impl Related<family_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FamilyMember.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
