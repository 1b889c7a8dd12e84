//! Allocation, rebalancing, and forecasting over a [`Plan`](crate::domain::Plan).
//!
//! Everything except [`apply_allocation`], [`apply_rebalancing`] and
//! [`process_due`] is a pure function of its borrowed inputs: results
//! describe proposed deltas and the plan is never touched. Degenerate input (no accounts, zero weights, dangling
//! preferred account, non-positive cash) yields a shorter or empty result
//! rather than an error, so previews are safe to compute on every keystroke.

use rust_decimal::{Decimal, RoundingStrategy};

pub use allocator::{allocation_plan, allocation_plan_detailed, split_into_accounts};
pub use apply::{ApplyContext, apply_allocation, apply_rebalancing};
pub use forecaster::forecast;
pub use rebalancer::rebalancing_moves;
pub use recurring::process_due;
pub use types::{AccountAllocation, AccountSplit, Forecast, RebalanceMove, TierAllocation, TierGrowth};

mod allocator;
mod apply;
pub mod errors;
mod forecaster;
mod rebalancer;
mod recurring;
mod types;

/// Rounds to cents, midpoints away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Like [`round_cents`], but truncates instead when rounding up would pass `limit`.
fn round_cents_within(amount: Decimal, limit: Decimal) -> Decimal {
    let rounded = round_cents(amount);
    if rounded > limit {
        amount
            .min(limit)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero)
    } else {
        rounded
    }
}
