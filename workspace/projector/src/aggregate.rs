//! Period aggregation: the month-view projection of all schedules,
//! merged with whatever instances have been persisted for that month.

use chrono::{Datelike, NaiveDate};
use model::entities::{schedule, schedule_instance};
use rust_decimal::Decimal;
use tracing::trace;

use common::{MonthSummary, PaymentState, ScheduledItem};

use crate::calendar::due_date_in_month;
use crate::frequency::resolve_due_months;

/// Aggregates all schedules due in the given (year, month) into a
/// [`MonthSummary`].
///
/// One item is synthesized per schedule whose resolved due-month set
/// contains `month` (monthly schedules match every month), with the due
/// day clamped to the month's length. A persisted instance for the same
/// (schedule, year, month) overrides the synthesized item — its amount
/// and paid fields are authoritative, so a definition amount changed
/// after the instance was created does not rewrite it.
///
/// `pending_amount` sums every non-paid item including overdue ones;
/// `overdue_amount` reports the overdue subset separately. Pure: no
/// mutation, no clock reads — `today` is the caller's reference date.
pub fn aggregate_for_month(
    schedules: &[schedule::Model],
    instances: &[schedule_instance::Model],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> MonthSummary {
    let mut summary = MonthSummary::empty(year, month);

    for sched in schedules {
        if !occurs_in_month(sched, month) {
            continue;
        }

        let Some(due_date) = due_date_in_month(year, month, sched.due_day.max(0) as u32) else {
            trace!(schedule_id = sched.id, year, month, "unconstructible due date; skipping");
            continue;
        };

        // Not active before the schedule starts.
        if due_date < sched.start_date {
            continue;
        }

        let persisted = instances.iter().find(|i| {
            i.schedule_id == sched.id
                && i.due_date.year() == year
                && i.due_date.month() == month
        });

        let item = match persisted {
            Some(instance) => {
                let paid = instance.status == schedule_instance::InstanceStatus::Paid;
                ScheduledItem {
                    schedule_id: sched.id,
                    schedule_name: sched.name.clone(),
                    instance_id: Some(instance.id),
                    due_date: instance.due_date,
                    amount: instance.expected_amount,
                    state: effective_state(instance.due_date, paid, today),
                    paid_amount: instance.paid_amount,
                    paid_date: instance.paid_date,
                    auto_linked: sched.is_auto_linked,
                }
            }
            None => ScheduledItem {
                schedule_id: sched.id,
                schedule_name: sched.name.clone(),
                instance_id: None,
                due_date,
                amount: sched.amount,
                state: effective_state(due_date, false, today),
                paid_amount: None,
                paid_date: None,
                auto_linked: sched.is_auto_linked,
            },
        };

        summary.total_amount += item.amount;
        match item.state {
            PaymentState::Paid => {
                summary.paid_amount += item.paid_amount.unwrap_or(item.amount);
            }
            PaymentState::Pending => {
                summary.pending_amount += item.amount;
            }
            PaymentState::Overdue => {
                // Overdue is a subset of pending.
                summary.pending_amount += item.amount;
                summary.overdue_amount += item.amount;
            }
        }

        summary.items.push(item);
    }

    summary
        .items
        .sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.schedule_id.cmp(&b.schedule_id)));

    summary
}

/// Twelve monthly aggregations for the annual calendar overview.
pub fn aggregate_for_year(
    schedules: &[schedule::Model],
    instances: &[schedule_instance::Model],
    year: i32,
    today: NaiveDate,
) -> Vec<MonthSummary> {
    (1..=12)
        .map(|month| aggregate_for_month(schedules, instances, year, month, today))
        .collect()
}

/// Whether a schedule has an occurrence in the given month. Malformed
/// schedules (custom with no months) occur nowhere rather than failing
/// the whole aggregation.
fn occurs_in_month(sched: &schedule::Model, month: u32) -> bool {
    if sched.frequency == schedule::Frequency::Monthly {
        return true;
    }
    match resolve_due_months(&sched.frequency, sched.due_months.as_ref()) {
        Ok(months) => months.contains(&month),
        Err(_) => {
            trace!(schedule_id = sched.id, "unresolvable due months; schedule never occurs");
            false
        }
    }
}

fn effective_state(due_date: NaiveDate, paid: bool, today: NaiveDate) -> PaymentState {
    if paid {
        PaymentState::Paid
    } else if due_date < today {
        PaymentState::Overdue
    } else {
        PaymentState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::entities::schedule::{DueMonths, Frequency};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_schedule(id: i32, name: &str, due_day: i32, amount: i64) -> schedule::Model {
        schedule::Model {
            id,
            name: name.to_string(),
            description: None,
            frequency: Frequency::Monthly,
            due_day,
            due_months: None,
            start_date: date(2025, 1, 1),
            amount: Decimal::new(amount, 0),
            is_auto_linked: false,
            linked_kind: None,
            linked_id: None,
            family_member_id: 1,
        }
    }

    fn paid_instance(
        id: i32,
        schedule_id: i32,
        due: NaiveDate,
        amount: i64,
    ) -> schedule_instance::Model {
        schedule_instance::Model {
            id,
            schedule_id,
            status: schedule_instance::InstanceStatus::Paid,
            due_date: due,
            expected_amount: Decimal::new(amount, 0),
            paid_date: Some(due),
            paid_amount: Some(Decimal::new(amount, 0)),
        }
    }

    #[test]
    fn buckets_split_paid_and_pending() {
        let schedules = vec![
            monthly_schedule(1, "Rent", 1, 100),
            monthly_schedule(2, "Power", 10, 200),
            monthly_schedule(3, "Internet", 20, 300),
        ];
        let instances = vec![paid_instance(7, 2, date(2026, 3, 10), 200)];

        let summary =
            aggregate_for_month(&schedules, &instances, 2026, 3, date(2026, 3, 5));

        assert_eq!(summary.items.len(), 3);
        assert_eq!(summary.total_amount, Decimal::new(600, 0));
        assert_eq!(summary.paid_amount, Decimal::new(200, 0));
        assert_eq!(summary.pending_amount, Decimal::new(400, 0));
    }

    #[test]
    fn overdue_is_counted_inside_pending() {
        // Rent (due 1st) is overdue on the 5th; Internet (due 20th) is not.
        let schedules = vec![
            monthly_schedule(1, "Rent", 1, 100),
            monthly_schedule(3, "Internet", 20, 300),
        ];

        let summary = aggregate_for_month(&schedules, &[], 2026, 3, date(2026, 3, 5));

        assert_eq!(summary.overdue_amount, Decimal::new(100, 0));
        assert_eq!(summary.pending_amount, Decimal::new(400, 0));
        assert!(summary.overdue_amount <= summary.pending_amount);
        let overdue: Vec<_> = summary
            .items
            .iter()
            .filter(|i| i.state == PaymentState::Overdue)
            .collect();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].schedule_id, 1);
    }

    #[test]
    fn due_today_is_not_overdue() {
        let schedules = vec![monthly_schedule(1, "Rent", 5, 100)];
        let summary = aggregate_for_month(&schedules, &[], 2026, 3, date(2026, 3, 5));
        assert_eq!(summary.items[0].state, PaymentState::Pending);
        assert_eq!(summary.overdue_amount, Decimal::ZERO);
    }

    #[test]
    fn persisted_instance_overrides_synthesized_item() {
        // Instance carries the amount from before the definition was
        // edited; the aggregation must report the instance's amount.
        let mut sched = monthly_schedule(1, "Rent", 1, 150);
        sched.amount = Decimal::new(175, 0);
        let instances = vec![paid_instance(9, 1, date(2026, 3, 1), 150)];

        let summary = aggregate_for_month(&[sched], &instances, 2026, 3, date(2026, 3, 20));

        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].instance_id, Some(9));
        assert_eq!(summary.items[0].amount, Decimal::new(150, 0));
        assert_eq!(summary.total_amount, Decimal::new(150, 0));
        assert_eq!(summary.paid_amount, Decimal::new(150, 0));
    }

    #[test]
    fn non_monthly_schedules_only_hit_their_months() {
        let half_yearly = schedule::Model {
            frequency: Frequency::HalfYearly,
            due_months: None,
            ..monthly_schedule(4, "Property Tax", 1, 8000)
        };

        let jan = aggregate_for_month(
            std::slice::from_ref(&half_yearly),
            &[],
            2026,
            1,
            date(2026, 1, 19),
        );
        assert_eq!(jan.items.len(), 1);
        assert_eq!(jan.overdue_amount, Decimal::new(8000, 0));

        let feb = aggregate_for_month(
            std::slice::from_ref(&half_yearly),
            &[],
            2026,
            2,
            date(2026, 1, 19),
        );
        assert!(feb.items.is_empty());
    }

    #[test]
    fn due_day_clamps_in_short_months() {
        let schedules = vec![monthly_schedule(1, "Card", 31, 100)];
        let summary = aggregate_for_month(&schedules, &[], 2026, 2, date(2026, 2, 1));
        assert_eq!(summary.items[0].due_date, date(2026, 2, 28));
    }

    #[test]
    fn start_date_excludes_earlier_periods() {
        let mut sched = monthly_schedule(1, "New SIP", 10, 500);
        sched.start_date = date(2026, 6, 1);

        let may = aggregate_for_month(
            std::slice::from_ref(&sched),
            &[],
            2026,
            5,
            date(2026, 5, 1),
        );
        assert!(may.items.is_empty());

        let june = aggregate_for_month(&[sched], &[], 2026, 6, date(2026, 5, 1));
        assert_eq!(june.items.len(), 1);
    }

    #[test]
    fn malformed_custom_schedule_is_skipped() {
        let broken = schedule::Model {
            frequency: Frequency::Custom,
            due_months: Some(DueMonths::new(vec![])),
            ..monthly_schedule(8, "Broken", 10, 100)
        };
        let summary = aggregate_for_month(&[broken], &[], 2026, 3, date(2026, 3, 1));
        assert!(summary.items.is_empty());
        assert_eq!(summary.total_amount, Decimal::ZERO);
    }

    #[test]
    fn yearly_view_has_twelve_months() {
        let schedules = vec![monthly_schedule(1, "Rent", 1, 100)];
        let year = aggregate_for_year(&schedules, &[], 2026, date(2026, 6, 15));
        assert_eq!(year.len(), 12);
        assert!(year.iter().all(|m| m.total_amount == Decimal::new(100, 0)));
        assert_eq!(year[0].month, 1);
        assert_eq!(year[11].month, 12);
    }
}
