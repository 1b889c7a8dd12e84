//! The starter plan written by `reserve init`.

use rust_decimal::dec;

use crate::domain::{Account, Plan, Tier};

/// Six tiers from short-term buffer to temporary holding, every balance at zero.
pub fn starter_plan() -> Plan {
    Plan::new(vec![
        Tier::new("Tier 1", "Buffer & short-term emergencies", dec!(30000), 1)
            .with_account(
                Account::new("Checking")
                    .with_apy(dec!(0.02))
                    .with_notes("Monthly expenses"),
            )
            .with_account(
                Account::new("Savings (Discover)")
                    .with_apy(dec!(4.11))
                    .with_notes("FDIC savings")
                    .with_weight(dec!(2))
                    .with_target(dec!(23000)),
            )
            .with_preferred("Savings (Discover)"),
        Tier::new("Tier 2", "Emergency fund", dec!(30000), 2)
            .with_account(
                Account::new("Savings/MM")
                    .with_apy(dec!(3.75))
                    .with_notes("Liquid reserve"),
            )
            .with_account(
                Account::new("USDC (Coinbase)")
                    .with_apy(dec!(5.20))
                    .with_notes("Stablecoin yield")
                    .with_weight(dec!(2))
                    .with_target(dec!(20000)),
            )
            .with_preferred("USDC (Coinbase)"),
        Tier::new("Tier 3", "Large capital expenditures", dec!(40000), 3)
            .with_account(
                Account::new("Short-Term Bonds (Schwab)")
                    .with_apy(dec!(4.25))
                    .with_notes("Ladder/ETF")
                    .with_weight(dec!(2))
                    .with_target(dec!(30000)),
            )
            .with_account(
                Account::new("USDC (Coinbase)")
                    .with_apy(dec!(4.50))
                    .with_target(dec!(10000)),
            )
            .with_preferred("Short-Term Bonds (Schwab)"),
        Tier::new("Tier 4", "Long-term debt reduction & income generation", dec!(100000), 4)
            .with_account(
                Account::new("Bonds")
                    .with_apy(dec!(4.25))
                    .with_notes("Income/low risk")
                    .with_weight(dec!(2)),
            )
            .with_account(
                Account::new("Dividend Stocks")
                    .with_apy(dec!(3.10))
                    .with_notes("After-tax income proxy"),
            )
            .with_account(
                Account::new("REITs")
                    .with_apy(dec!(4.50))
                    .with_notes("Higher yield"),
            )
            .with_account(
                Account::new("Crypto")
                    .with_apy(dec!(40))
                    .with_notes("High risk / high potential"),
            )
            .with_preferred("Bonds"),
        Tier::new("Tier 5", "Capital gains tax holding (1-yr horizon)", dec!(25000), 5)
            .with_account(
                Account::new("Short-Term Bonds (Schwab)")
                    .with_apy(dec!(4.25))
                    .with_notes("Hold until taxes due"),
            )
            .with_preferred("Short-Term Bonds (Schwab)"),
        Tier::new("Tier 6", "Temporary holding (unallocated cash)", dec!(0), 6)
            .with_account(
                Account::new("Savings")
                    .with_apy(dec!(3.75))
                    .with_notes("Parking until allocated"),
            )
            .with_preferred("Savings"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preferred_account_resolves() {
        let plan = starter_plan();
        for tier in &plan.tiers {
            assert!(tier.preferred().is_some(), "{} has a dangling preferred account", tier.name);
        }
    }

    #[test]
    fn starter_plan_is_empty_with_a_growth_tier() {
        let plan = starter_plan();
        assert_eq!(plan.total_reserves(), dec!(0));
        assert_eq!(plan.growth_tier().map(|tier| tier.name.as_str()), Some("Tier 4"));
    }
}
