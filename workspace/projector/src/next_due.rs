//! Next-occurrence resolution: given a schedule's recurrence terms and
//! a reference date, find the next due date (reference-day inclusive).

use chrono::{Datelike, NaiveDate};
use model::entities::schedule::{self, DueMonths, Frequency};
use tracing::trace;

use common::DueStatus;

use crate::calendar::due_date_in_month;
use crate::frequency::resolve_due_months;

/// Finds the next occurrence of a schedule on or after `reference`.
///
/// Comparison is date-only; an occurrence falling on the reference date
/// counts as the next occurrence rather than as already passed. Monthly
/// schedules resolve against `due_day` alone; the other frequencies
/// search their resolved due-month set in the reference year, then wrap
/// to the first due month of the following year. The day is clamped to
/// the target month's length in every case.
///
/// Returns `None` only for a malformed non-monthly schedule whose
/// due-month set cannot be resolved (e.g. custom with no months).
/// Callers in display paths treat that as "no next occurrence".
pub fn next_due_date(
    frequency: &Frequency,
    due_day: u32,
    due_months: Option<&DueMonths>,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    if *frequency == Frequency::Monthly {
        let candidate = due_date_in_month(reference.year(), reference.month(), due_day)?;
        if candidate >= reference {
            return Some(candidate);
        }
        // Passed this month already; roll to the next month, wrapping
        // December into January of the next year.
        let (year, month) = if reference.month() == 12 {
            (reference.year() + 1, 1)
        } else {
            (reference.year(), reference.month() + 1)
        };
        return due_date_in_month(year, month, due_day);
    }

    let months = match resolve_due_months(frequency, due_months) {
        Ok(months) if !months.is_empty() => months,
        Ok(_) | Err(_) => {
            trace!(?frequency, "no resolvable due months; no next occurrence");
            return None;
        }
    };

    // Current month, when it is a due month and the day has not passed.
    if months.contains(&reference.month()) {
        let candidate = due_date_in_month(reference.year(), reference.month(), due_day)?;
        if candidate >= reference {
            return Some(candidate);
        }
    }

    // Smallest due month later in the reference year, else wrap to the
    // first due month of the next year.
    match months.iter().find(|&&m| m > reference.month()) {
        Some(&month) => due_date_in_month(reference.year(), month, due_day),
        None => due_date_in_month(reference.year() + 1, months[0], due_day),
    }
}

/// Schedule-level wrapper. Occurrences before the schedule's start date
/// are not active, so a reference date earlier than `start_date` is
/// advanced to it before resolving.
pub fn next_due_for_schedule(
    schedule: &schedule::Model,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    let reference = reference.max(schedule.start_date);
    next_due_date(
        &schedule.frequency,
        schedule.due_day.max(0) as u32,
        schedule.due_months.as_ref(),
        reference,
    )
}

/// Classifies a due date against a reference date for list views.
pub fn due_status(due_date: NaiveDate, reference: NaiveDate) -> DueStatus {
    if due_date < reference {
        DueStatus::Overdue
    } else if due_date == reference {
        DueStatus::DueToday
    } else {
        DueStatus::Upcoming
    }
}
