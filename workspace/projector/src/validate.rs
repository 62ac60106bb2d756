//! Construction-time validation of schedule definitions. Raised here,
//! at the service boundary, rather than deep inside the date math.

use model::entities::schedule::{DueMonths, Frequency};
use rust_decimal::Decimal;

use crate::error::{ProjectorError, Result};

/// Validates the recurrence terms of a schedule definition before it is
/// inserted or updated.
pub fn validate_definition(
    frequency: &Frequency,
    due_day: i32,
    due_months: Option<&DueMonths>,
    amount: Decimal,
) -> Result<()> {
    if !(1..=31).contains(&due_day) {
        return Err(ProjectorError::Validation(format!(
            "due day {due_day} is outside 1..=31"
        )));
    }

    if amount <= Decimal::ZERO {
        return Err(ProjectorError::Validation(
            "amount must be positive".to_string(),
        ));
    }

    if let Some(months) = due_months {
        if let Some(bad) = months.0.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ProjectorError::Validation(format!(
                "due month {bad} is outside 1..=12"
            )));
        }
    }

    if *frequency == Frequency::Custom && due_months.map_or(true, |m| m.is_empty()) {
        return Err(ProjectorError::Validation(
            "custom frequency requires a non-empty due-month set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_plain_monthly_definition() {
        assert!(validate_definition(&Frequency::Monthly, 15, None, Decimal::new(100, 0)).is_ok());
    }

    #[test]
    fn rejects_due_day_out_of_range() {
        for day in [0, -3, 32] {
            let err =
                validate_definition(&Frequency::Monthly, day, None, Decimal::new(100, 0))
                    .unwrap_err();
            assert!(matches!(err, ProjectorError::Validation(_)));
        }
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in [Decimal::ZERO, Decimal::new(-1, 0)] {
            let err =
                validate_definition(&Frequency::Monthly, 1, None, amount).unwrap_err();
            assert!(matches!(err, ProjectorError::Validation(_)));
        }
    }

    #[test]
    fn rejects_custom_without_months() {
        let err = validate_definition(&Frequency::Custom, 1, None, Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));

        let empty = DueMonths::new(vec![]);
        let err =
            validate_definition(&Frequency::Custom, 1, Some(&empty), Decimal::new(100, 0))
                .unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));
    }

    #[test]
    fn rejects_month_out_of_range() {
        let months = DueMonths(vec![0, 3]);
        let err =
            validate_definition(&Frequency::Custom, 1, Some(&months), Decimal::new(100, 0))
                .unwrap_err();
        assert!(matches!(err, ProjectorError::Validation(_)));
    }

    #[test]
    fn accepts_custom_with_months() {
        let months = DueMonths::new(vec![3, 6, 9, 12]);
        assert!(
            validate_definition(&Frequency::Custom, 5, Some(&months), Decimal::new(2500, 0))
                .is_ok()
        );
    }
}
