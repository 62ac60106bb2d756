use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::family_member;

/// A loan. Its EMI materializes as an auto-linked monthly schedule.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub lender: String,
    /// Original principal, informational only.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub principal: Decimal,
    /// Monthly installment amount.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub emi_amount: Decimal,
    /// Day of month the installment is due.
    pub emi_day: i32,
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
