//! Serializes plans and ledger rows, and renders the text reports.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{Plan, RecurringTransaction, Transaction};
use crate::engine::{AccountAllocation, Forecast, RebalanceMove, TierAllocation, round_cents};

pub fn write_plan(plan: &Plan, mut writer: impl Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, plan)?;
    writeln!(writer)?;
    Ok(())
}

/// Stamps `last_updated` and writes the plan to `path`.
pub fn save_plan(plan: &mut Plan, path: &Path) -> anyhow::Result<()> {
    plan.last_updated = Utc::now();
    let mut writer = BufWriter::new(File::create(path)?);
    write_plan(plan, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), "saved plan");
    Ok(())
}

pub fn write_schedules(schedules: &[RecurringTransaction], mut writer: impl Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, schedules)?;
    writeln!(writer)?;
    Ok(())
}

pub fn save_schedules(schedules: &[RecurringTransaction], path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_schedules(schedules, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), count = schedules.len(), "saved recurring schedules");
    Ok(())
}

pub fn write_ledger(
    transactions: &[Transaction],
    writer: impl Write,
    include_header: bool,
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(include_header)
        .from_writer(writer);
    for transaction in transactions {
        wtr.serialize(transaction)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Appends to the ledger at `path`, writing the header only into a new or empty file.
pub fn append_ledger(transactions: &[Transaction], path: &Path) -> anyhow::Result<()> {
    if transactions.is_empty() {
        return Ok(());
    }
    let include_header = fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    write_ledger(transactions, file, include_header)?;
    info!(path = %path.display(), rows = transactions.len(), "appended to ledger");
    Ok(())
}

pub fn print_status(plan: &Plan, mut writer: impl Write) -> anyhow::Result<()> {
    writeln!(
        writer,
        "As of {} - Total Reserves: {}",
        plan.last_updated.format("%Y-%m-%d"),
        money(plan.total_reserves())
    )?;
    writeln!(writer)?;
    writeln!(writer, "{:<12} {:>14} {:>14} {:>14}", "Tier", "Target", "Current", "Gap")?;
    writeln!(writer, "{}", "-".repeat(57))?;
    for tier in plan.sorted_by_priority() {
        writeln!(
            writer,
            "{:<12} {:>14} {:>14} {:>14}",
            tier.name,
            money(tier.target),
            money(tier.total()),
            money(tier.gap())
        )?;
        if let Some(preferred) = &tier.preferred_account {
            writeln!(writer, "    Preferred: {preferred}")?;
        }
        for account in &tier.accounts {
            let apy = if account.apy_pct.is_zero() {
                String::new()
            } else {
                format!(" @ {}%", account.apy_pct.round_dp(2))
            };
            let cap = account
                .account_target
                .map(|target| format!(" cap={}", money(target)))
                .unwrap_or_default();
            writeln!(
                writer,
                "  - {}: {}{apy} w={}{cap}",
                account.name,
                money(account.balance),
                account.alloc_weight.normalize()
            )?;
        }
    }
    Ok(())
}

pub fn print_allocation(
    amount: Decimal,
    allocations: &[TierAllocation],
    mut writer: impl Write,
) -> anyhow::Result<()> {
    if allocations.is_empty() {
        writeln!(writer, "No allocation needed - all targets met.")?;
        return Ok(());
    }
    writeln!(writer, "Proposed allocation for {} (by priority, tier-level):", money(amount))?;
    for allocation in allocations {
        writeln!(writer, "  -> {}: {}", allocation.tier, money(allocation.amount))?;
    }
    let allocated: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
    print_remainder(amount, allocated, writer)
}

pub fn print_detailed_allocation(
    amount: Decimal,
    allocations: &[AccountAllocation],
    mut writer: impl Write,
) -> anyhow::Result<()> {
    if allocations.is_empty() {
        writeln!(writer, "No allocation needed - all targets met.")?;
        return Ok(());
    }
    writeln!(writer, "Proposed allocation for {} (by priority, split by accounts):", money(amount))?;
    for allocation in allocations {
        writeln!(
            writer,
            "  -> {} / {}: {}",
            allocation.tier,
            allocation.account,
            money(allocation.amount)
        )?;
    }
    let allocated: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
    print_remainder(amount, allocated, writer)
}

fn print_remainder(amount: Decimal, allocated: Decimal, mut writer: impl Write) -> anyhow::Result<()> {
    writeln!(writer, "Total allocated: {}", money(allocated))?;
    let remainder = amount - allocated;
    if round_cents(remainder) > Decimal::ZERO {
        writeln!(writer, "Unallocated remainder: {}", money(remainder))?;
    }
    Ok(())
}

pub fn print_rebalancing(moves: &[RebalanceMove], mut writer: impl Write) -> anyhow::Result<()> {
    if moves.is_empty() {
        writeln!(writer, "No rebalancing suggested - no overfunded tier can cover an underfunded one.")?;
        return Ok(());
    }
    writeln!(writer, "Suggested rebalancing moves:")?;
    for rebalance in moves {
        writeln!(writer, "  <-> {rebalance}: {}", money(rebalance.amount))?;
    }
    Ok(())
}

pub fn print_forecast(forecast: &Forecast, mut writer: impl Write) -> anyhow::Result<()> {
    writeln!(
        writer,
        "Projected growth over {} months (compounded monthly):",
        forecast.months()
    )?;
    for entry in forecast.tiers() {
        writeln!(writer, "  {}: {}", entry.tier, money(entry.growth))?;
    }
    writeln!(writer, "  Total: {}", money(forecast.total()))?;
    Ok(())
}

pub fn print_history(transactions: &[Transaction], mut writer: impl Write) -> anyhow::Result<()> {
    if transactions.is_empty() {
        writeln!(writer, "No transactions recorded.")?;
        return Ok(());
    }
    for transaction in transactions {
        writeln!(
            writer,
            "{} {:<10} {} / {}: {} (balance {}) {} [{}]",
            transaction.timestamp.format("%Y-%m-%d %H:%M"),
            transaction.kind.to_string(),
            transaction.tier_name,
            transaction.account_name,
            money(transaction.amount),
            money(transaction.balance_after),
            transaction.description,
            transaction.user
        )?;
    }
    Ok(())
}

pub fn print_schedules(schedules: &[RecurringTransaction], mut writer: impl Write) -> anyhow::Result<()> {
    if schedules.is_empty() {
        writeln!(writer, "No recurring transactions.")?;
        return Ok(());
    }
    for schedule in schedules {
        let paused = if schedule.enabled { "" } else { " (paused)" };
        writeln!(
            writer,
            "  {}: {} {} -> {} / {}, next {}{paused}",
            schedule.name,
            money(schedule.amount),
            schedule.frequency,
            schedule.tier_name,
            schedule.account_name,
            schedule.next_date.format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

pub fn print_processed(transactions: &[Transaction], mut writer: impl Write) -> anyhow::Result<()> {
    if transactions.is_empty() {
        writeln!(writer, "No recurring transactions due.")?;
        return Ok(());
    }
    writeln!(writer, "Processed {} recurring transactions:", transactions.len())?;
    for transaction in transactions {
        writeln!(
            writer,
            "  {}: {} to {} / {}",
            transaction.description,
            money(transaction.amount),
            transaction.tier_name,
            transaction.account_name
        )?;
    }
    Ok(())
}

/// `$1,234.50` style, rounded to cents.
fn money(amount: Decimal) -> String {
    let mut rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded.set_sign_positive(true);
    rounded.rescale(2);

    let digits = rounded.to_string();
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
