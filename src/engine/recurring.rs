use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{Plan, RecurringTransaction, Transaction, TransactionKind};
use crate::engine::ApplyContext;

/// Applies every schedule due on or before `today` to the plan, once each,
/// and moves it to its next date.
///
/// A schedule whose tier or account no longer exists is logged and left on
/// its current date, so it is retried on the next run. Overdue schedules
/// catch up one occurrence per run.
pub fn process_due(
    plan: &mut Plan,
    schedules: &mut [RecurringTransaction],
    today: NaiveDate,
    context: &ApplyContext,
) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for schedule in schedules.iter_mut().filter(|schedule| schedule.is_due(today)) {
        let Some(next_date) = schedule.frequency.next_after(schedule.next_date) else {
            warn!(name = %schedule.name, date = %schedule.next_date, "no next date; skipping schedule");
            continue;
        };
        let description = if schedule.description.is_empty() {
            format!("Recurring: {}", schedule.name)
        } else {
            format!("Recurring: {} - {}", schedule.name, schedule.description)
        };

        match context.record(
            plan,
            &schedule.tier_name,
            &schedule.account_name,
            schedule.amount,
            TransactionKind::Recurring,
            &description,
        ) {
            Ok(transaction) => {
                schedule.next_date = next_date;
                transactions.push(transaction);
            }
            Err(e) => warn!(name = %schedule.name, "failed to process recurring transaction: {e}"),
        }
    }

    info!(processed = transactions.len(), %today, "processed recurring transactions");
    transactions
}
