use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{
    family_member, insurance_policy, investment, loan, schedule, schedule_instance,
};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create family_members table
        manager
            .create_table(
                Table::create()
                    .table(FamilyMember::table())
                    .if_not_exists()
                    .col(pk_auto(FamilyMember::column(family_member::Column::Id)))
                    .col(string(FamilyMember::column(family_member::Column::Name)).unique_key())
                    .col(string_null(FamilyMember::column(
                        family_member::Column::Relationship,
                    )))
                    .to_owned(),
            )
            .await?;

        // Create schedules table
        manager
            .create_table(
                Table::create()
                    .table(Schedule::table())
                    .if_not_exists()
                    .col(pk_auto(Schedule::column(schedule::Column::Id)))
                    .col(string(Schedule::column(schedule::Column::Name)))
                    .col(string_null(Schedule::column(schedule::Column::Description)))
                    .col(string(Schedule::column(schedule::Column::Frequency)).string_len(10))
                    .col(integer(Schedule::column(schedule::Column::DueDay)))
                    .col(json_null(Schedule::column(schedule::Column::DueMonths)))
                    .col(date(Schedule::column(schedule::Column::StartDate)))
                    .col(decimal(Schedule::column(schedule::Column::Amount)).decimal_len(16, 4))
                    .col(
                        boolean(Schedule::column(schedule::Column::IsAutoLinked))
                            .default(false),
                    )
                    .col(
                        string_null(Schedule::column(schedule::Column::LinkedKind))
                            .string_len(10),
                    )
                    .col(integer_null(Schedule::column(schedule::Column::LinkedId)))
                    .col(integer(Schedule::column(schedule::Column::FamilyMemberId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_family_member")
                            .from(
                                Schedule::table(),
                                Schedule::column(schedule::Column::FamilyMemberId),
                            )
                            .to(
                                FamilyMember::table(),
                                FamilyMember::column(family_member::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create schedule_instances table
        manager
            .create_table(
                Table::create()
                    .table(ScheduleInstance::table())
                    .if_not_exists()
                    .col(pk_auto(ScheduleInstance::column(
                        schedule_instance::Column::Id,
                    )))
                    .col(integer(ScheduleInstance::column(
                        schedule_instance::Column::ScheduleId,
                    )))
                    .col(
                        string(ScheduleInstance::column(schedule_instance::Column::Status))
                            .string_len(10),
                    )
                    .col(date(ScheduleInstance::column(
                        schedule_instance::Column::DueDate,
                    )))
                    .col(
                        decimal(ScheduleInstance::column(
                            schedule_instance::Column::ExpectedAmount,
                        ))
                        .decimal_len(16, 4),
                    )
                    .col(date_null(ScheduleInstance::column(
                        schedule_instance::Column::PaidDate,
                    )))
                    .col(
                        decimal_null(ScheduleInstance::column(
                            schedule_instance::Column::PaidAmount,
                        ))
                        .decimal_len(16, 4),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_instances_schedule")
                            .from(
                                ScheduleInstance::table(),
                                ScheduleInstance::column(schedule_instance::Column::ScheduleId),
                            )
                            .to(Schedule::table(), Schedule::column(schedule::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One instance per (schedule, due date)
        manager
            .create_index(
                Index::create()
                    .name("uq_schedule_instances_schedule_due_date")
                    .table(ScheduleInstance::table())
                    .col(ScheduleInstance::column(
                        schedule_instance::Column::ScheduleId,
                    ))
                    .col(ScheduleInstance::column(schedule_instance::Column::DueDate))
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create insurance_policies table
        manager
            .create_table(
                Table::create()
                    .table(InsurancePolicy::table())
                    .if_not_exists()
                    .col(pk_auto(InsurancePolicy::column(
                        insurance_policy::Column::Id,
                    )))
                    .col(string(InsurancePolicy::column(
                        insurance_policy::Column::Name,
                    )))
                    .col(string(InsurancePolicy::column(
                        insurance_policy::Column::Provider,
                    )))
                    .col(
                        decimal(InsurancePolicy::column(insurance_policy::Column::Premium))
                            .decimal_len(16, 4),
                    )
                    .col(
                        string(InsurancePolicy::column(
                            insurance_policy::Column::Frequency,
                        ))
                        .string_len(10),
                    )
                    .col(integer(InsurancePolicy::column(
                        insurance_policy::Column::DueDay,
                    )))
                    .col(json_null(InsurancePolicy::column(
                        insurance_policy::Column::DueMonths,
                    )))
                    .col(date(InsurancePolicy::column(
                        insurance_policy::Column::StartDate,
                    )))
                    .col(integer(InsurancePolicy::column(
                        insurance_policy::Column::FamilyMemberId,
                    )))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_insurance_policies_family_member")
                            .from(
                                InsurancePolicy::table(),
                                InsurancePolicy::column(insurance_policy::Column::FamilyMemberId),
                            )
                            .to(
                                FamilyMember::table(),
                                FamilyMember::column(family_member::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create loans table
        manager
            .create_table(
                Table::create()
                    .table(Loan::table())
                    .if_not_exists()
                    .col(pk_auto(Loan::column(loan::Column::Id)))
                    .col(string(Loan::column(loan::Column::Name)))
                    .col(string(Loan::column(loan::Column::Lender)))
                    .col(decimal(Loan::column(loan::Column::Principal)).decimal_len(16, 4))
                    .col(decimal(Loan::column(loan::Column::EmiAmount)).decimal_len(16, 4))
                    .col(integer(Loan::column(loan::Column::EmiDay)))
                    .col(date(Loan::column(loan::Column::StartDate)))
                    .col(integer(Loan::column(loan::Column::FamilyMemberId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loans_family_member")
                            .from(Loan::table(), Loan::column(loan::Column::FamilyMemberId))
                            .to(
                                FamilyMember::table(),
                                FamilyMember::column(family_member::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create investments table
        manager
            .create_table(
                Table::create()
                    .table(Investment::table())
                    .if_not_exists()
                    .col(pk_auto(Investment::column(investment::Column::Id)))
                    .col(string(Investment::column(investment::Column::Name)))
                    .col(string_null(Investment::column(investment::Column::Kind)))
                    .col(
                        decimal(Investment::column(investment::Column::SipAmount))
                            .decimal_len(16, 4),
                    )
                    .col(integer(Investment::column(investment::Column::SipDay)))
                    .col(date(Investment::column(investment::Column::StartDate)))
                    .col(integer(Investment::column(
                        investment::Column::FamilyMemberId,
                    )))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_investments_family_member")
                            .from(
                                Investment::table(),
                                Investment::column(investment::Column::FamilyMemberId),
                            )
                            .to(
                                FamilyMember::table(),
                                FamilyMember::column(family_member::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Investment::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Loan::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InsurancePolicy::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduleInstance::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Schedule::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FamilyMember::table()).to_owned())
            .await?;

        Ok(())
    }
}
