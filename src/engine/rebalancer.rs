use rust_decimal::{Decimal, dec};
use tracing::debug;

use crate::domain::{Plan, Tier};
use crate::engine::{RebalanceMove, round_cents};

/// Balances at or below this count as settled, absorbing rounding residue.
const SETTLED: Decimal = dec!(0.005);

/// Pairs overfunded tiers (plan order) with underfunded tiers (priority
/// order) and proposes transfers, greedily, one pair at a time.
///
/// The result is advisory: the plan is not changed. Excess or need that finds
/// no counterpart is simply left unmatched.
pub fn rebalancing_moves(plan: &Plan) -> Vec<RebalanceMove> {
    let mut under: Vec<(&Tier, Decimal)> = plan
        .sorted_by_priority()
        .into_iter()
        .map(|tier| (tier, tier.gap()))
        .filter(|(_, gap)| *gap > Decimal::ZERO)
        .collect();
    let mut over: Vec<(&Tier, Decimal)> = plan
        .tiers
        .iter()
        .map(|tier| (tier, tier.excess()))
        .filter(|(_, excess)| *excess > Decimal::ZERO)
        .collect();

    let mut moves = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < over.len() && j < under.len() {
        let (from, excess) = &mut over[i];
        let (to, need) = &mut under[j];

        let amount = round_cents((*excess).min(*need));
        if amount > Decimal::ZERO {
            debug!(from = %from.name, to = %to.name, %amount, "matched rebalancing move");
            moves.push(RebalanceMove::new(&from.name, &to.name, amount));
            *excess -= amount;
            *need -= amount;
        }
        if *excess <= SETTLED {
            i += 1;
        }
        if *need <= SETTLED {
            j += 1;
        }
    }
    moves
}
