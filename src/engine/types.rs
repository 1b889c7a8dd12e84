use derive_more::Display;
use rust_decimal::Decimal;

/// Cash routed to one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAllocation {
    pub tier: String,
    pub amount: Decimal,
}

impl TierAllocation {
    pub fn new(tier: impl Into<String>, amount: Decimal) -> Self {
        Self {
            tier: tier.into(),
            amount,
        }
    }
}

/// Cash routed to one account of one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAllocation {
    pub tier: String,
    pub account: String,
    pub amount: Decimal,
}

impl AccountAllocation {
    pub fn new(tier: impl Into<String>, account: impl Into<String>, amount: Decimal) -> Self {
        Self {
            tier: tier.into(),
            account: account.into(),
            amount,
        }
    }
}

/// One account's share of a within-tier split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSplit {
    pub account: String,
    pub amount: Decimal,
}

impl AccountSplit {
    pub fn new(account: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account: account.into(),
            amount,
        }
    }
}

/// A proposed transfer from an overfunded tier to an underfunded one.
/// Displays as its route, `"From ➜ To"`.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{from} ➜ {to}")]
pub struct RebalanceMove {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

impl RebalanceMove {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Decimal) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
    pub fn route(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierGrowth {
    pub tier: String,
    pub growth: Decimal,
}

/// Projected interest per tier, in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    months: u32,
    tiers: Vec<TierGrowth>,
}

impl Forecast {
    pub(crate) fn new(months: u32, tiers: Vec<TierGrowth>) -> Self {
        Self { months, tiers }
    }
    pub fn months(&self) -> u32 {
        self.months
    }
    pub fn tiers(&self) -> &[TierGrowth] {
        &self.tiers
    }
    /// Growth for the first tier with this name.
    pub fn get(&self, tier: &str) -> Option<Decimal> {
        self.tiers
            .iter()
            .find(|entry| entry.tier == tier)
            .map(|entry| entry.growth)
    }
    pub fn total(&self) -> Decimal {
        self.tiers.iter().map(|entry| entry.growth).sum()
    }
}
