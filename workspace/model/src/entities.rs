//! This file serves as the root for all SeaORM entity modules.
//! The data models for the family finance tracker live here: the
//! household members, the recurring-payment schedules with their
//! concrete instances, and the three entity kinds (insurance, loans,
//! investments) that produce auto-linked schedules.

pub mod family_member;
pub mod insurance_policy;
pub mod investment;
pub mod loan;
pub mod schedule;
pub mod schedule_instance;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::family_member::Entity as FamilyMember;
    pub use super::insurance_policy::Entity as InsurancePolicy;
    pub use super::investment::Entity as Investment;
    pub use super::loan::Entity as Loan;
    pub use super::schedule::Entity as Schedule;
    pub use super::schedule_instance::Entity as ScheduleInstance;
}
