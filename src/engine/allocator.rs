//! Routing new cash into tiers by priority, then into accounts inside a tier.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::{Plan, Tier};
use crate::engine::{AccountAllocation, AccountSplit, TierAllocation, round_cents_within};

/// Tier-level allocation of `new_cash`, in funding order.
///
/// Tiers are visited by priority and each gap is filled as far as the cash
/// allows. Whatever is left once every target is met goes to the growth tier
/// as a separate trailing entry; without a growth tier it is not allocated.
pub fn allocation_plan(plan: &Plan, new_cash: Decimal) -> Vec<TierAllocation> {
    fund_tiers(plan, new_cash)
        .into_iter()
        .map(|(tier, amount)| TierAllocation::new(&tier.name, amount))
        .collect()
}

/// Same funding order as [`allocation_plan`], with every tier amount broken
/// down by [`split_into_accounts`].
///
/// The growth tier can be funded twice (its own gap, then the leftover). The
/// second split sees what the first one already placed, so caps still hold.
pub fn allocation_plan_detailed(plan: &Plan, new_cash: Decimal) -> Vec<AccountAllocation> {
    let mut placed: HashMap<&str, Vec<Decimal>> = HashMap::new();
    let mut allocations = Vec::new();

    for (tier, amount) in fund_tiers(plan, new_cash) {
        let prior = placed
            .entry(tier.name.as_str())
            .or_insert_with(|| vec![Decimal::ZERO; tier.accounts.len()]);
        let assigned = assign_to_accounts(tier, amount, prior);
        for (total, added) in prior.iter_mut().zip(&assigned) {
            *total += *added;
        }
        allocations.extend(
            ordered_splits(tier, &assigned)
                .into_iter()
                .map(|split| AccountAllocation::new(&tier.name, split.account, split.amount)),
        );
    }
    allocations
}

fn fund_tiers(plan: &Plan, new_cash: Decimal) -> Vec<(&Tier, Decimal)> {
    let mut remaining = new_cash.max(Decimal::ZERO);
    let mut funded = Vec::new();

    for tier in plan.sorted_by_priority() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let gap = tier.gap();
        if gap <= Decimal::ZERO {
            continue;
        }
        let amount = round_cents_within(remaining.min(gap), remaining);
        if amount > Decimal::ZERO {
            debug!(tier = %tier.name, %gap, %amount, "filling tier gap");
            funded.push((tier, amount));
            remaining -= amount;
        }
    }

    if remaining > Decimal::ZERO {
        match plan.growth_tier() {
            Some(tier) => {
                let amount = round_cents_within(remaining, remaining);
                if amount > Decimal::ZERO {
                    debug!(tier = %tier.name, %amount, "routing leftover to growth tier");
                    funded.push((tier, amount));
                }
            }
            None => warn!(%remaining, "no growth tier; leftover cash left unallocated"),
        }
    }
    funded
}

/// Splits `amount` across the accounts of `tier`.
///
/// The preferred account, when it resolves and has room, is filled first.
/// The rest is shared by weight among accounts with room left, pass after
/// pass, until the cash is placed or no account can take more. Within a pass
/// every share is taken from the cash left at the start of that pass, not from
/// what is left after the previous account in the same pass was paid. Cash
/// that cannot be placed (every account capped, or a residue too small to
/// share in whole cents) is dropped from the result.
///
/// The preferred account comes first in the output, then the other
/// recipients in account order, each listed once.
pub fn split_into_accounts(tier: &Tier, amount: Decimal) -> Vec<AccountSplit> {
    let assigned = assign_to_accounts(tier, amount, &vec![Decimal::ZERO; tier.accounts.len()]);
    ordered_splits(tier, &assigned)
}

/// Amounts added to each account, index-aligned with `tier.accounts`. Room is
/// measured after `prior`, cash already headed to those accounts.
fn assign_to_accounts(tier: &Tier, amount: Decimal, prior: &[Decimal]) -> Vec<Decimal> {
    let mut assigned = vec![Decimal::ZERO; tier.accounts.len()];
    let mut remaining = amount.max(Decimal::ZERO);
    if remaining <= Decimal::ZERO || tier.accounts.is_empty() {
        return assigned;
    }

    let room_left = |index: usize, assigned: &[Decimal]| {
        tier.accounts[index]
            .remaining_room()
            .map(|room| (room - prior[index] - assigned[index]).max(Decimal::ZERO))
    };

    let preferred = preferred_index(tier);
    if let Some(index) = preferred {
        let limit = cap(remaining, room_left(index, &assigned));
        let add = round_cents_within(limit, limit);
        if add > Decimal::ZERO {
            assigned[index] += add;
            remaining -= add;
        }
    }

    while remaining > Decimal::ZERO {
        let candidates: Vec<(usize, Option<Decimal>)> = (0..tier.accounts.len())
            .map(|index| (index, room_left(index, &assigned)))
            .filter(|(_, room)| room.is_none_or(|room| room > Decimal::ZERO))
            .collect();
        let Some(&(first, first_room)) = candidates.first() else {
            warn!(tier = %tier.name, %remaining, "every account is capped; residual left unallocated");
            break;
        };

        let total_weight = candidates.iter().try_fold(Decimal::ZERO, |total, (index, _)| {
            total.checked_add(tier.accounts[*index].effective_weight())
        });
        let Some(total_weight) = total_weight.filter(|total| *total > Decimal::ZERO) else {
            if total_weight.is_none() {
                warn!(tier = %tier.name, "account weights too large to total; filling first account");
            }
            let limit = cap(remaining, first_room);
            let add = round_cents_within(limit, limit);
            assigned[first] += add;
            remaining -= add;
            debug!(tier = %tier.name, account = %tier.accounts[first].name, %add, "no usable weights; filling first account");
            break;
        };

        let pass_cash = remaining;
        let mut progressed = false;
        for (index, room) in candidates {
            let share = pass_cash * (tier.accounts[index].effective_weight() / total_weight);
            let limit = cap(remaining, room);
            let add = round_cents_within(share.min(limit), limit);
            if add > Decimal::ZERO {
                assigned[index] += add;
                remaining -= add;
                progressed = true;
            }
        }
        if !progressed {
            warn!(tier = %tier.name, %remaining, "weighted split stalled; residual left unallocated");
            break;
        }
    }
    assigned
}

fn preferred_index(tier: &Tier) -> Option<usize> {
    let name = tier.preferred_account.as_deref()?;
    let position = tier.accounts.iter().position(|account| account.name == name);
    if position.is_none() {
        warn!(tier = %tier.name, account = name, "preferred account not found");
    }
    position
}

fn ordered_splits(tier: &Tier, assigned: &[Decimal]) -> Vec<AccountSplit> {
    let preferred = tier
        .preferred_account
        .as_deref()
        .and_then(|name| tier.accounts.iter().position(|account| account.name == name));
    let others = tier
        .accounts
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != preferred);

    preferred
        .map(|index| (index, &tier.accounts[index]))
        .into_iter()
        .chain(others)
        .filter(|(index, _)| assigned[*index] > Decimal::ZERO)
        .map(|(index, account)| AccountSplit::new(&account.name, assigned[index]))
        .collect()
}

fn cap(amount: Decimal, room: Option<Decimal>) -> Decimal {
    room.map_or(amount, |room| amount.min(room))
}
