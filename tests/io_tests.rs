mod common;

use std::fs;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{context, plan, tier};
use reserve_tiers::{
    defaults,
    domain::{Account, Frequency, RecurringTransaction, TransactionKind},
    engine::{self, AccountAllocation, ApplyContext, apply_allocation},
    output,
    parsing::{self, ParseError},
};
use rust_decimal::dec;

const LEGACY_PLAN: &str = include_str!("io_tests/legacy_plan.json");
const LEDGER_HEADER: &str = "timestamp,tier,account,amount,balance_after,type,description,user";

#[test]
fn reads_legacy_plan_with_defaults() -> anyhow::Result<()> {
    let plan = parsing::read_plan(LEGACY_PLAN.as_bytes())?;

    assert_eq!(plan.last_updated, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(plan.total_reserves(), dec!(19250.5));

    let tier_1 = plan.tier("Tier 1").unwrap();
    assert_eq!(tier_1.preferred().map(|account| account.name.as_str()), Some("Savings (Discover)"));
    let checking = tier_1.account("Checking").unwrap();
    assert_eq!(checking.apy_pct, dec!(0.02));
    assert_eq!(checking.account_target, None);
    let savings = tier_1.account("Savings (Discover)").unwrap();
    assert_eq!(savings.notes, "");
    assert_eq!(savings.remaining_room(), Some(dec!(5000)));

    let tier_4 = plan.tier("Tier 4").unwrap();
    assert_eq!(tier_4.preferred_account, None);
    assert_eq!(
        tier_4.accounts,
        vec![Account::new("Bonds")],
        "missing account fields take their defaults"
    );
    Ok(())
}

#[test]
fn plan_round_trips_through_json() -> anyhow::Result<()> {
    let plan = defaults::starter_plan();

    let mut buffer = Vec::new();
    output::write_plan(&plan, &mut buffer)?;
    let read_back = parsing::read_plan(buffer.as_slice())?;

    assert_eq!(read_back, plan);
    Ok(())
}

#[test]
fn save_stamps_last_updated() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plan.json");
    let mut plan = parsing::read_plan(LEGACY_PLAN.as_bytes())?;
    let before = Utc::now();

    output::save_plan(&mut plan, &path)?;
    let loaded = parsing::load_plan(&path)?;

    assert!(loaded.last_updated >= before);
    assert_eq!(loaded.tiers, plan.tiers);
    Ok(())
}

#[test]
fn missing_plan_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let result = parsing::load_plan(&path);

    assert!(matches!(result, Err(ParseError::PlanNotFound(missing)) if missing == path));
}

#[test]
fn ledger_appends_with_a_single_header() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ledger.csv");
    let mut plan = plan(vec![tier(
        "Tier 1",
        dec!(100),
        1,
        vec![Account::new("Checking"), Account::new("Savings, High Yield")],
    )]);

    let first = apply_allocation(
        &mut plan,
        &[AccountAllocation::new("Tier 1", "Checking", dec!(25.50))],
        &context(),
    )?;
    let second = apply_allocation(
        &mut plan,
        &[AccountAllocation::new("Tier 1", "Savings, High Yield", dec!(10))],
        &context(),
    )?;
    output::append_ledger(&first, &path)?;
    output::append_ledger(&second, &path)?;

    let contents = fs::read_to_string(&path)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], LEDGER_HEADER);
    assert_eq!(contents.matches(LEDGER_HEADER).count(), 1);

    let ledger = parsing::read_ledger(&path, None, None, None)?;
    assert_eq!(ledger, [first, second].concat());

    let savings_only = parsing::read_ledger(&path, Some("Tier 1"), Some("Savings, High Yield"), None)?;
    assert_eq!(savings_only.len(), 1);
    assert_eq!(savings_only[0].kind, TransactionKind::Allocation);
    assert_eq!(savings_only[0].balance_after, dec!(10));
    Ok(())
}

#[test]
fn missing_ledger_reads_as_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    assert!(parsing::read_ledger(&dir.path().join("none.csv"), None, None, None)?.is_empty());
    Ok(())
}

#[test]
fn malformed_ledger_rows_are_skipped() -> anyhow::Result<()> {
    let input = format!(
        "{LEDGER_HEADER}\n\
         2025-03-01T09:30:00Z,Tier 1,Checking,25.50,25.50,allocation,Allocated,tester\n\
         not-a-date,Tier 1,Checking,1,1,allocation,Broken,tester\n\
         2025-03-01T09:31:00Z,Tier 1,Checking,-5,20.50,unknown_kind,Broken,tester\n"
    );
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let transactions: Vec<_> = parsing::deserialize_ledger(&mut rdr).collect();

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].amount, dec!(25.50));
    Ok(())
}

#[test]
fn reports_render_proposals() -> anyhow::Result<()> {
    let plan = plan(vec![
        tier("Tier 1", dec!(1000), 1, vec![Account::new("Checking")]),
        tier("Tier 2", dec!(0), 2, vec![Account::new("Savings").with_balance(dec!(2400)).with_apy(dec!(6))]),
    ]);

    let mut status = Vec::new();
    output::print_status(&plan, &mut status)?;
    let status = String::from_utf8(status)?;
    assert!(status.contains("Total Reserves: $2,400.00"));
    assert!(status.contains("  - Savings: $2,400.00 @ 6% w=1"));

    let mut allocation = Vec::new();
    output::print_allocation(dec!(1500), &engine::allocation_plan(&plan, dec!(1500)), &mut allocation)?;
    let allocation = String::from_utf8(allocation)?;
    assert!(allocation.contains("  -> Tier 1: $1,000.00"));
    assert!(allocation.contains("Unallocated remainder: $500.00"));

    let mut rebalancing = Vec::new();
    output::print_rebalancing(&engine::rebalancing_moves(&plan), &mut rebalancing)?;
    assert!(String::from_utf8(rebalancing)?.contains("  <-> Tier 2 ➜ Tier 1: $1,000.00"));

    let mut forecast = Vec::new();
    output::print_forecast(&engine::forecast(&plan, 1), &mut forecast)?;
    let forecast = String::from_utf8(forecast)?;
    assert!(forecast.contains("  Tier 2: $12.00"));
    assert!(forecast.contains("  Total: $12.00"));
    Ok(())
}

#[test]
fn history_window_drops_older_rows() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ledger.csv");
    let mut plan = plan(vec![tier("Tier 1", dec!(100), 1, vec![Account::new("Checking")])]);
    let deposit = [AccountAllocation::new("Tier 1", "Checking", dec!(10))];

    let january = ApplyContext::at("tester", Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap());
    output::append_ledger(&apply_allocation(&mut plan, &deposit, &january)?, &path)?;
    output::append_ledger(&apply_allocation(&mut plan, &deposit, &context())?, &path)?;

    let cutoff = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let recent = parsing::read_ledger(&path, None, None, Some(cutoff))?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].timestamp, context().timestamp);
    assert_eq!(recent[0].balance_after, dec!(20));
    Ok(())
}

#[test]
fn reads_schedules_in_the_legacy_layout() -> anyhow::Result<()> {
    let input = r#"[
      {
        "name": "Paycheck",
        "tier_name": "Tier 1",
        "account_name": "Checking",
        "amount": 1500.0,
        "frequency": "biweekly",
        "next_date": "2025-03-07"
      },
      {
        "name": "Gym",
        "tier_name": "Tier 1",
        "account_name": "Checking",
        "amount": -45.5,
        "frequency": "monthly",
        "next_date": "2025-03-15",
        "enabled": false,
        "description": "membership"
      }
    ]"#;

    let schedules = parsing::read_schedules(input.as_bytes())?;

    assert_eq!(
        schedules,
        vec![
            RecurringTransaction::new(
                "Paycheck",
                "Tier 1",
                "Checking",
                dec!(1500),
                Frequency::Biweekly,
                NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            ),
            RecurringTransaction {
                enabled: false,
                ..RecurringTransaction::new(
                    "Gym",
                    "Tier 1",
                    "Checking",
                    dec!(-45.5),
                    Frequency::Monthly,
                    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
                )
                .with_description("membership")
            },
        ]
    );
    Ok(())
}

#[test]
fn schedules_survive_save_and_load() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("recurring.json");
    assert!(parsing::load_schedules(&path)?.is_empty());

    let schedules = vec![RecurringTransaction::new(
        "Dividends",
        "Tier 4",
        "Brokerage",
        dec!(120.25),
        Frequency::Quarterly,
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    )];
    output::save_schedules(&schedules, &path)?;

    assert!(fs::read_to_string(&path)?.contains(r#""next_date": "2025-12-31""#));
    assert_eq!(parsing::load_schedules(&path)?, schedules);
    Ok(())
}

#[test]
fn reports_render_schedules() -> anyhow::Result<()> {
    let schedules = vec![RecurringTransaction {
        enabled: false,
        ..RecurringTransaction::new(
            "Gym",
            "Tier 1",
            "Checking",
            dec!(-45.5),
            Frequency::Monthly,
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        )
    }];

    let mut listing = Vec::new();
    output::print_schedules(&schedules, &mut listing)?;
    assert_eq!(
        String::from_utf8(listing)?,
        "  Gym: -$45.50 monthly -> Tier 1 / Checking, next 2025-03-15 (paused)\n"
    );

    let mut processed = Vec::new();
    output::print_processed(&[], &mut processed)?;
    assert_eq!(String::from_utf8(processed)?, "No recurring transactions due.\n");
    Ok(())
}
