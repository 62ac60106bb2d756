pub mod family_members;
pub mod health;
pub mod instances;
pub mod insurance_policies;
pub mod investments;
pub mod loans;
pub mod schedules;
pub mod summary;

use chrono::{NaiveDate, Utc};
use model::entities::schedule;
use sea_orm::{ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter};

/// Resolves the reference date for a request: the optional `as_of`
/// override when given, else today. Computed once per request at this
/// boundary and threaded through every projector call — the projector
/// itself never reads the clock, so a whole aggregation sees one
/// consistent "today".
pub fn reference_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Finds the schedule auto-linked to a source entity (insurance
/// policy, loan or investment).
pub(crate) async fn find_linked_schedule(
    db: &DbConn,
    kind: schedule::LinkedKind,
    linked_id: i32,
) -> Result<Option<schedule::Model>, DbErr> {
    schedule::Entity::find()
        .filter(schedule::Column::LinkedKind.eq(kind))
        .filter(schedule::Column::LinkedId.eq(linked_id))
        .one(db)
        .await
}
