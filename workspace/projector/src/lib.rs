//! The recurring schedule projector: pure, synchronous date math over
//! already-loaded schedule rows. Nothing in this crate touches the
//! database or the clock — callers load a consistent snapshot of
//! schedules and instances and pass a single reference date per call,
//! which keeps overdue classification consistent across a batch and
//! makes every function trivially safe to call concurrently.

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod frequency;
pub mod next_due;
pub mod validate;

pub use aggregate::{aggregate_for_month, aggregate_for_year};
pub use calendar::{clamp_day, days_in_month, ordinal_suffix};
pub use error::{ProjectorError, Result};
pub use frequency::resolve_due_months;
pub use next_due::{due_status, next_due_date, next_due_for_schedule};
pub use validate::validate_definition;
