use rust_decimal::{Decimal, MathematicalOps, dec};
use tracing::warn;

use crate::domain::{Account, Plan};
use crate::engine::{Forecast, TierGrowth};

/// Interest each tier would earn over `months`, compounding monthly on
/// today's balances. Contributions are not modelled and the figures are
/// growth only, not future balances.
pub fn forecast(plan: &Plan, months: u32) -> Forecast {
    let tiers = plan
        .tiers
        .iter()
        .map(|tier| TierGrowth {
            tier: tier.name.clone(),
            growth: tier
                .accounts
                .iter()
                .map(|account| expected_growth(account, months))
                .sum(),
        })
        .collect();
    Forecast::new(months, tiers)
}

fn expected_growth(account: &Account, months: u32) -> Decimal {
    if months == 0 || account.apy_pct <= Decimal::ZERO || account.balance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let monthly_rate = account.apy_pct / dec!(100) / dec!(12);
    let growth = (Decimal::ONE + monthly_rate)
        .checked_powi(i64::from(months))
        .and_then(|factor| account.balance.checked_mul(factor - Decimal::ONE));

    growth.unwrap_or_else(|| {
        warn!(account = %account.name, months, "growth overflowed; counting it as zero");
        Decimal::ZERO
    })
}
