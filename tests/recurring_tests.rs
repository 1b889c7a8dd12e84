mod common;

use chrono::NaiveDate;
use common::{context, funded, plan, tier};
use reserve_tiers::{
    domain::{Frequency, Plan, RecurringTransaction, TransactionKind},
    engine::process_due,
};
use rust_decimal::{Decimal, dec};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn checking_plan() -> Plan {
    plan(vec![tier(
        "Tier 1",
        dec!(1000),
        1,
        vec![funded("Checking", dec!(200))],
    )])
}

fn checking_balance(plan: &Plan) -> Decimal {
    plan.tier("Tier 1").unwrap().account("Checking").unwrap().balance
}

#[test]
fn due_schedule_is_applied_and_advanced() {
    let mut plan = checking_plan();
    let mut schedules = vec![
        RecurringTransaction::new(
            "Paycheck",
            "Tier 1",
            "Checking",
            dec!(500),
            Frequency::Monthly,
            date(2025, 12, 31),
        )
        .with_description("salary"),
    ];

    let transactions = process_due(&mut plan, &mut schedules, date(2025, 12, 31), &context());

    assert_eq!(checking_balance(&plan), dec!(700));
    assert_eq!(schedules[0].next_date, date(2026, 1, 31));
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::Recurring);
    assert_eq!(transactions[0].amount, dec!(500));
    assert_eq!(transactions[0].balance_after, dec!(700));
    assert_eq!(transactions[0].description, "Recurring: Paycheck - salary");
    assert_eq!(transactions[0].user, "tester");
}

#[test]
fn withdrawals_use_negative_amounts() {
    let mut plan = checking_plan();
    let mut schedules = vec![RecurringTransaction::new(
        "Rent",
        "Tier 1",
        "Checking",
        dec!(-150),
        Frequency::Weekly,
        date(2025, 3, 1),
    )];

    let transactions = process_due(&mut plan, &mut schedules, date(2025, 3, 3), &context());

    assert_eq!(checking_balance(&plan), dec!(50));
    assert_eq!(transactions[0].description, "Recurring: Rent");
    assert_eq!(schedules[0].next_date, date(2025, 3, 8));
}

#[test]
fn future_and_paused_schedules_are_left_alone() {
    let mut plan = checking_plan();
    let mut schedules = vec![
        RecurringTransaction::new(
            "Later",
            "Tier 1",
            "Checking",
            dec!(10),
            Frequency::Daily,
            date(2025, 3, 2),
        ),
        RecurringTransaction {
            enabled: false,
            ..RecurringTransaction::new(
                "Paused",
                "Tier 1",
                "Checking",
                dec!(10),
                Frequency::Daily,
                date(2025, 2, 1),
            )
        },
    ];
    let before = schedules.clone();

    let transactions = process_due(&mut plan, &mut schedules, date(2025, 3, 1), &context());

    assert!(transactions.is_empty());
    assert_eq!(schedules, before);
    assert_eq!(checking_balance(&plan), dec!(200));
}

#[test]
fn schedule_for_missing_account_is_skipped_and_kept_due() {
    let mut plan = checking_plan();
    let mut schedules = vec![
        RecurringTransaction::new(
            "Orphan",
            "Tier 1",
            "Closed Account",
            dec!(25),
            Frequency::Monthly,
            date(2025, 1, 31),
        ),
        RecurringTransaction::new(
            "Paycheck",
            "Tier 1",
            "Checking",
            dec!(25),
            Frequency::Monthly,
            date(2025, 1, 31),
        ),
    ];

    let transactions = process_due(&mut plan, &mut schedules, date(2025, 2, 1), &context());

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].account_name, "Checking");
    assert_eq!(schedules[0].next_date, date(2025, 1, 31));
    assert_eq!(schedules[1].next_date, date(2025, 2, 28));
    assert_eq!(checking_balance(&plan), dec!(225));
}

#[test]
fn overdue_schedule_catches_up_one_occurrence_per_run() {
    let mut plan = checking_plan();
    let mut schedules = vec![RecurringTransaction::new(
        "Savings sweep",
        "Tier 1",
        "Checking",
        dec!(5),
        Frequency::Daily,
        date(2025, 2, 25),
    )];

    process_due(&mut plan, &mut schedules, date(2025, 3, 1), &context());
    process_due(&mut plan, &mut schedules, date(2025, 3, 1), &context());

    assert_eq!(schedules[0].next_date, date(2025, 2, 27));
    assert_eq!(checking_balance(&plan), dec!(210));
}
