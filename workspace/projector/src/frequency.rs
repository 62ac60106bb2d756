//! Expansion of a schedule frequency into the concrete set of months
//! it recurs in.

use model::entities::schedule::{DueMonths, Frequency};

use crate::error::{ProjectorError, Result};

/// Resolves a frequency to its due-month set, sorted ascending.
///
/// `Monthly` answers the full `[1..=12]` set for callers that want the
/// set form; most callers instead special-case monthly schedules via
/// `due_day` alone and never ask for the set. Both paths are valid.
///
/// `Quarterly` is hardcoded to calendar quarters (Jan/Apr/Jul/Oct) and
/// is deliberately not derived from the schedule's start date.
/// `HalfYearly` is likewise fixed to Jan/Jul. `Yearly` uses the
/// explicit month when one is set and defaults to January. `Custom`
/// requires a non-empty explicit set.
pub fn resolve_due_months(
    frequency: &Frequency,
    explicit: Option<&DueMonths>,
) -> Result<Vec<u32>> {
    let months = match frequency {
        Frequency::Monthly => (1..=12).collect(),
        Frequency::Quarterly => vec![1, 4, 7, 10],
        Frequency::HalfYearly => vec![1, 7],
        Frequency::Yearly => match explicit {
            Some(m) if !m.is_empty() => normalized(m)?,
            _ => vec![1],
        },
        Frequency::Custom => match explicit {
            Some(m) if !m.is_empty() => normalized(m)?,
            _ => {
                return Err(ProjectorError::Validation(
                    "custom frequency requires a non-empty due-month set".to_string(),
                ))
            }
        },
    };

    Ok(months)
}

/// Sorted, deduplicated copy of an explicit month set, rejecting
/// out-of-range values. Stored sets are already sorted; rows written
/// before validation existed may not be.
fn normalized(explicit: &DueMonths) -> Result<Vec<u32>> {
    if let Some(bad) = explicit.0.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(ProjectorError::Validation(format!(
            "due month {bad} is outside 1..=12"
        )));
    }
    let mut months = explicit.0.clone();
    months.sort_unstable();
    months.dedup();
    Ok(months)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_expands_to_all_months() {
        let months = resolve_due_months(&Frequency::Monthly, None).unwrap();
        assert_eq!(months, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn quarterly_is_fixed_to_calendar_quarters() {
        // Fixed regardless of any explicit set the row carries.
        let explicit = DueMonths::new(vec![2, 5, 8, 11]);
        let months = resolve_due_months(&Frequency::Quarterly, Some(&explicit)).unwrap();
        assert_eq!(months, vec![1, 4, 7, 10]);
        let months = resolve_due_months(&Frequency::Quarterly, None).unwrap();
        assert_eq!(months, vec![1, 4, 7, 10]);
    }

    #[test]
    fn half_yearly_is_january_and_july() {
        let months = resolve_due_months(&Frequency::HalfYearly, None).unwrap();
        assert_eq!(months, vec![1, 7]);
    }

    #[test]
    fn yearly_defaults_to_january() {
        let months = resolve_due_months(&Frequency::Yearly, None).unwrap();
        assert_eq!(months, vec![1]);
        let empty = DueMonths::new(vec![]);
        let months = resolve_due_months(&Frequency::Yearly, Some(&empty)).unwrap();
        assert_eq!(months, vec![1]);
    }

    #[test]
    fn yearly_honors_explicit_month() {
        let explicit = DueMonths::new(vec![4]);
        let months = resolve_due_months(&Frequency::Yearly, Some(&explicit)).unwrap();
        assert_eq!(months, vec![4]);
    }

    #[test]
    fn custom_requires_explicit_months() {
        let err = resolve_due_months(&Frequency::Custom, None).unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));

        let empty = DueMonths::new(vec![]);
        let err = resolve_due_months(&Frequency::Custom, Some(&empty)).unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));
    }

    #[test]
    fn custom_sorts_and_dedups() {
        let explicit = DueMonths(vec![9, 3, 3, 12]);
        let months = resolve_due_months(&Frequency::Custom, Some(&explicit)).unwrap();
        assert_eq!(months, vec![3, 9, 12]);
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        let explicit = DueMonths(vec![3, 13]);
        let err = resolve_due_months(&Frequency::Custom, Some(&explicit)).unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));
    }
}
