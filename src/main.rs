use std::io;
use std::path::PathBuf;

use anyhow::bail;
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand};
use rust_decimal::Decimal;

use reserve_tiers::defaults;
use reserve_tiers::domain::{
    DomainError, Frequency, Plan, RecurringTransaction, Tier, Transaction, TransactionKind,
};
use reserve_tiers::engine::{self, ApplyContext};
use reserve_tiers::output;
use reserve_tiers::parsing;

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    if let Some(log_level) = args.log_level {
        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(io::stderr)
            .init();
    }

    match args.command {
        Command::Init { force } => {
            if args.plan.exists() && !force {
                bail!("{} already exists. Use --force to overwrite.", args.plan.display());
            }
            output::save_plan(&mut defaults::starter_plan(), &args.plan)?;
            println!("Initialized {} with default tiers.", args.plan.display());
        }
        Command::Status => {
            let plan = parsing::load_plan(&args.plan)?;
            output::print_status(&plan, io::stdout())?;
        }
        Command::Allocate { amount, apply } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            let allocations = engine::allocation_plan(&plan, amount);
            output::print_allocation(amount, &allocations, io::stdout())?;
            if apply {
                let detailed = engine::allocation_plan_detailed(&plan, amount);
                commit_allocation(&mut plan, &detailed, &args)?;
            }
        }
        Command::AllocateDetailed { amount, apply } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            let detailed = engine::allocation_plan_detailed(&plan, amount);
            output::print_detailed_allocation(amount, &detailed, io::stdout())?;
            if apply {
                commit_allocation(&mut plan, &detailed, &args)?;
            }
        }
        Command::Rebalance { apply } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            let moves = engine::rebalancing_moves(&plan);
            output::print_rebalancing(&moves, io::stdout())?;
            if apply && !moves.is_empty() {
                let context = ApplyContext::new(&args.user);
                let transactions = engine::apply_rebalancing(&mut plan, &moves, &context)?;
                persist(&mut plan, &transactions, &args)?;
                println!("Applied {} moves ({} balance changes).", moves.len(), transactions.len());
            }
        }
        Command::Forecast { months } => {
            let plan = parsing::load_plan(&args.plan)?;
            output::print_forecast(&engine::forecast(&plan, months), io::stdout())?;
        }
        Command::SetBalance {
            ref tier,
            ref account,
            balance,
            apy,
            ref notes,
        } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            let entry = plan.try_tier_mut(tier)?.upsert_account(account);
            let delta = balance - entry.balance;
            entry.balance = balance;
            if let Some(apy) = apy {
                entry.apy_pct = apy;
            }
            if let Some(notes) = notes.as_deref().filter(|notes| !notes.is_empty()) {
                entry.notes = notes.to_owned();
            }
            let transactions = if delta.is_zero() {
                Vec::new()
            } else {
                vec![Transaction {
                    timestamp: chrono::Utc::now(),
                    tier_name: tier.clone(),
                    account_name: account.clone(),
                    amount: delta,
                    balance_after: balance,
                    kind: TransactionKind::Manual,
                    description: "Balance set manually".to_owned(),
                    user: args.user.clone(),
                }]
            };
            persist(&mut plan, &transactions, &args)?;
            println!("Updated {account} in {tier} to {balance}.");
        }
        Command::SetTarget { ref tier, target } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.try_tier_mut(tier)?.target = target;
            persist(&mut plan, &[], &args)?;
            println!("Updated target for {tier} to {target}.");
        }
        Command::SetPreferredAccount { ref tier, ref account } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.try_tier_mut(tier)?.set_preferred(account.as_deref())?;
            persist(&mut plan, &[], &args)?;
            println!(
                "Preferred account for {tier} set to: {}",
                account.as_deref().unwrap_or("none")
            );
        }
        Command::SetAccountWeight {
            ref tier,
            ref account,
            weight,
        } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.try_tier_mut(tier)?.upsert_account(account).alloc_weight = weight;
            persist(&mut plan, &[], &args)?;
            println!("Set weight for {account} in {tier} to {weight}.");
        }
        Command::SetAccountTarget {
            ref tier,
            ref account,
            target,
        } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.try_tier_mut(tier)?.upsert_account(account).account_target = Some(target);
            persist(&mut plan, &[], &args)?;
            println!("Set account-level target for {account} in {tier} to {target}.");
        }
        Command::AddTier {
            ref name,
            ref purpose,
            target,
            priority,
        } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.add_tier(Tier::new(name, purpose, target, priority))?;
            persist(&mut plan, &[], &args)?;
            println!("Added {name}.");
        }
        Command::RemoveTier { ref name } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            plan.remove_tier(name)?;
            persist(&mut plan, &[], &args)?;
            println!("Removed {name}.");
        }
        Command::History {
            ref tier,
            ref account,
            days,
        } => {
            let since = Utc::now() - Duration::days(i64::from(days));
            let transactions = parsing::read_ledger(
                &args.ledger,
                tier.as_deref(),
                account.as_deref(),
                Some(since),
            )?;
            output::print_history(&transactions, io::stdout())?;
        }
        Command::RecurringAdd {
            ref name,
            ref tier,
            ref account,
            amount,
            frequency,
            next_date,
            ref description,
        } => {
            let plan = parsing::load_plan(&args.plan)?;
            if plan.try_tier(tier)?.account(account).is_none() {
                return Err(DomainError::AccountNotFound {
                    tier: tier.clone(),
                    account: account.clone(),
                }
                .into());
            }
            let mut schedules = parsing::load_schedules(&args.schedules)?;
            if schedules.iter().any(|schedule| schedule.name == *name) {
                bail!("Recurring transaction '{name}' already exists.");
            }
            let next_date = next_date.unwrap_or_else(|| Local::now().date_naive());
            schedules.push(
                RecurringTransaction::new(name, tier, account, amount, frequency, next_date)
                    .with_description(description.as_str()),
            );
            output::save_schedules(&schedules, &args.schedules)?;
            println!("Added recurring transaction {name} ({frequency}), next on {next_date}.");
        }
        Command::RecurringList => {
            let schedules = parsing::load_schedules(&args.schedules)?;
            output::print_schedules(&schedules, io::stdout())?;
        }
        Command::RecurringRemove { ref name } => {
            let mut schedules = parsing::load_schedules(&args.schedules)?;
            let before = schedules.len();
            schedules.retain(|schedule| schedule.name != *name);
            if schedules.len() == before {
                bail!("Recurring transaction '{name}' not found.");
            }
            output::save_schedules(&schedules, &args.schedules)?;
            println!("Removed recurring transaction {name}.");
        }
        Command::RecurringSetEnabled { ref name, enabled } => {
            let mut schedules = parsing::load_schedules(&args.schedules)?;
            let Some(schedule) = schedules.iter_mut().find(|schedule| schedule.name == *name) else {
                bail!("Recurring transaction '{name}' not found.");
            };
            schedule.enabled = enabled;
            output::save_schedules(&schedules, &args.schedules)?;
            println!(
                "Recurring transaction {name} {}.",
                if enabled { "enabled" } else { "paused" }
            );
        }
        Command::RecurringProcess { date } => {
            let mut plan = parsing::load_plan(&args.plan)?;
            let mut schedules = parsing::load_schedules(&args.schedules)?;
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            let context = ApplyContext::new(&args.user);
            let transactions = engine::process_due(&mut plan, &mut schedules, today, &context);
            output::print_processed(&transactions, io::stdout())?;
            if !transactions.is_empty() {
                persist(&mut plan, &transactions, &args)?;
                output::save_schedules(&schedules, &args.schedules)?;
            }
        }
    }
    Ok(())
}

fn commit_allocation(
    plan: &mut Plan,
    allocations: &[engine::AccountAllocation],
    args: &Arguments,
) -> anyhow::Result<()> {
    if allocations.is_empty() {
        return Ok(());
    }
    let context = ApplyContext::new(&args.user);
    let transactions = engine::apply_allocation(plan, allocations, &context)?;
    persist(plan, &transactions, args)?;
    println!("Applied allocation to {} accounts.", transactions.len());
    Ok(())
}

fn persist(plan: &mut Plan, transactions: &[Transaction], args: &Arguments) -> anyhow::Result<()> {
    output::save_plan(plan, &args.plan)?;
    output::append_ledger(transactions, &args.ledger)
}

#[derive(Parser)]
#[command(name = "reserve", about = "Manage tiered cash reserves")]
struct Arguments {
    /// Plan file.
    #[arg(long, env = "RESERVE_PLAN", default_value = "reserve_plan.json", global = true)]
    plan: PathBuf,
    /// Transaction ledger (CSV).
    #[arg(long, env = "RESERVE_LEDGER", default_value = "reserve_ledger.csv", global = true)]
    ledger: PathBuf,
    /// Recurring transaction schedules (JSON).
    #[arg(long, env = "RESERVE_SCHEDULES", default_value = "reserve_recurring.json", global = true)]
    schedules: PathBuf,
    /// Name recorded on ledger entries.
    #[arg(long, env = "RESERVE_USER", default_value = "system", global = true)]
    user: String,
    #[arg(long, global = true)]
    log_level: Option<tracing::Level>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the starter plan.
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Show tiers, balances and gaps.
    Status,
    /// Preview (or apply) a tier-level allocation of new cash.
    Allocate {
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(long)]
        apply: bool,
    },
    /// Preview (or apply) an allocation split down to accounts.
    AllocateDetailed {
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,
        #[arg(long)]
        apply: bool,
    },
    /// Suggest (or apply) moves from overfunded to underfunded tiers.
    Rebalance {
        #[arg(long)]
        apply: bool,
    },
    /// Project interest over a number of months.
    Forecast {
        #[arg(long, default_value_t = 12)]
        months: u32,
    },
    SetBalance {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        account: String,
        #[arg(long, allow_negative_numbers = true)]
        balance: Decimal,
        #[arg(long, allow_negative_numbers = true)]
        apy: Option<Decimal>,
        #[arg(long)]
        notes: Option<String>,
    },
    SetTarget {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        target: Decimal,
    },
    /// Set the account that receives new money first; omit --account to clear it.
    SetPreferredAccount {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        account: Option<String>,
    },
    SetAccountWeight {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        account: String,
        #[arg(long, allow_negative_numbers = true)]
        weight: Decimal,
    },
    SetAccountTarget {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        account: String,
        #[arg(long)]
        target: Decimal,
    },
    AddTier {
        #[arg(long)]
        name: String,
        #[arg(long)]
        purpose: String,
        #[arg(long)]
        target: Decimal,
        #[arg(long, allow_negative_numbers = true)]
        priority: i64,
    },
    RemoveTier {
        #[arg(long)]
        name: String,
    },
    /// Show recorded transactions.
    History {
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        account: Option<String>,
        /// Only show the last N days.
        #[arg(long, default_value_t = 365)]
        days: u32,
    },
    /// Schedule a recurring deposit (or, with a negative amount, withdrawal).
    RecurringAdd {
        #[arg(long)]
        name: String,
        #[arg(long)]
        tier: String,
        #[arg(long)]
        account: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: Decimal,
        /// daily, weekly, biweekly, monthly, quarterly or annually.
        #[arg(long)]
        frequency: Frequency,
        /// First occurrence (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        next_date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
    },
    RecurringList,
    RecurringRemove {
        #[arg(long)]
        name: String,
    },
    /// Pause or resume a schedule.
    RecurringSetEnabled {
        #[arg(long)]
        name: String,
        #[arg(long, action = ArgAction::Set)]
        enabled: bool,
    },
    /// Apply every schedule due on or before --date (default today).
    RecurringProcess {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}
