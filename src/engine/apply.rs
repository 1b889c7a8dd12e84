//! Applying proposals to a plan and producing the matching ledger records.
//!
//! Both entry points work on a scratch copy and only commit it once every
//! step succeeded, so an error leaves the caller's plan as it was.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{Plan, Tier, Transaction, TransactionKind};
use crate::engine::{
    AccountAllocation, RebalanceMove, errors::EngineError, round_cents, round_cents_within,
    split_into_accounts,
};

/// Who applies a change, and when. Stamped on every transaction produced.
#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

impl ApplyContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self::at(user, Utc::now())
    }
    pub fn at(user: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            timestamp,
        }
    }

    pub(crate) fn record(
        &self,
        plan: &mut Plan,
        tier: &str,
        account: &str,
        amount: Decimal,
        kind: TransactionKind,
        description: &str,
    ) -> Result<Transaction, EngineError> {
        let target = plan.account_mut(tier, account)?;
        target.balance += amount;
        Ok(Transaction {
            timestamp: self.timestamp,
            tier_name: tier.to_owned(),
            account_name: account.to_owned(),
            amount,
            balance_after: target.balance,
            kind,
            description: description.to_owned(),
            user: self.user.clone(),
        })
    }
}

/// Credits each allocation to its account, one transaction per entry.
pub fn apply_allocation(
    plan: &mut Plan,
    allocations: &[AccountAllocation],
    context: &ApplyContext,
) -> Result<Vec<Transaction>, EngineError> {
    let total: Decimal = allocations.iter().map(|allocation| allocation.amount).sum();
    let mut shown = round_cents(total);
    shown.rescale(2);
    let description = format!("Allocated from {shown} total");

    let mut working = plan.clone();
    let transactions = allocations
        .iter()
        .map(|allocation| {
            context.record(
                &mut working,
                &allocation.tier,
                &allocation.account,
                allocation.amount,
                TransactionKind::Allocation,
                &description,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    *plan = working;
    info!(entries = transactions.len(), %total, "applied allocation");
    Ok(transactions)
}

/// Carries out rebalancing moves in order.
///
/// Each move first splits its amount across the destination tier's accounts.
/// Only what the destination can actually absorb is then withdrawn from the
/// source tier, in proportion to each account's positive balance, so the plan
/// total is unchanged. Withdrawals are recorded as negative amounts.
pub fn apply_rebalancing(
    plan: &mut Plan,
    moves: &[RebalanceMove],
    context: &ApplyContext,
) -> Result<Vec<Transaction>, EngineError> {
    let mut working = plan.clone();
    let mut transactions = Vec::new();

    for rebalance in moves {
        let description = format!("Rebalance {rebalance}");
        let deposits = split_into_accounts(working.try_tier(&rebalance.to)?, rebalance.amount);
        let placed: Decimal = deposits.iter().map(|split| split.amount).sum();
        if placed < rebalance.amount {
            warn!(route = %rebalance, %placed, requested = %rebalance.amount, "destination could not absorb the full move");
        }

        let withdrawals = withdrawal_split(working.try_tier(&rebalance.from)?, placed)?;
        for (account, amount) in withdrawals {
            transactions.push(context.record(
                &mut working,
                &rebalance.from,
                &account,
                -amount,
                TransactionKind::Rebalance,
                &description,
            )?);
        }
        for split in deposits {
            transactions.push(context.record(
                &mut working,
                &rebalance.to,
                &split.account,
                split.amount,
                TransactionKind::Rebalance,
                &description,
            )?);
        }
    }

    *plan = working;
    info!(moves = moves.len(), entries = transactions.len(), "applied rebalancing");
    Ok(transactions)
}

/// Spreads a withdrawal of `amount` over the tier's funded accounts in
/// proportion to their balances. Cent rounding residue is taken from the
/// first accounts that still hold money.
fn withdrawal_split(tier: &Tier, amount: Decimal) -> Result<Vec<(String, Decimal)>, EngineError> {
    let funded: Vec<(&str, Decimal)> = tier
        .accounts
        .iter()
        .filter(|account| account.balance > Decimal::ZERO)
        .map(|account| (account.name.as_str(), account.balance))
        .collect();
    let available: Decimal = funded.iter().map(|(_, balance)| *balance).sum();

    if amount > available {
        return Err(EngineError::InsufficientFunds {
            tier: tier.name.clone(),
            needed: amount,
            available,
        });
    }
    if amount <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let mut left = amount;
    let mut takes: Vec<Decimal> = funded
        .iter()
        .map(|(_, balance)| {
            let take = round_cents_within(amount * *balance / available, left.min(*balance));
            left -= take;
            take
        })
        .collect();

    for ((_, balance), take) in funded.iter().zip(takes.iter_mut()) {
        if left <= Decimal::ZERO {
            break;
        }
        let extra = left.min(*balance - *take);
        *take += extra;
        left -= extra;
    }

    Ok(funded
        .into_iter()
        .zip(takes)
        .filter(|(_, take)| *take > Decimal::ZERO)
        .map(|((name, _), take)| (name.to_owned(), take))
        .collect())
}
