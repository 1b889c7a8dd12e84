//! Core domain types: accounts, tiers, plans, ledger transactions and
//! recurring schedules.

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Tier not found: {0}")]
    TierNotFound(String),
    #[error("Account '{account}' not found in {tier}")]
    AccountNotFound { tier: String, account: String },
    #[error("Tier '{0}' already exists")]
    DuplicateTier(String),
    #[error("Unknown frequency '{0}' (expected daily, weekly, biweekly, monthly, quarterly or annually)")]
    UnknownFrequency(String),
}

/// A single account inside a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub balance: Decimal,
    /// Annual percentage yield, e.g. `4.25` for 4.25%.
    #[serde(default)]
    pub apy_pct: Decimal,
    #[serde(default)]
    pub notes: String,
    /// Relative weight when splitting money inside the tier.
    #[serde(default = "default_weight")]
    pub alloc_weight: Decimal,
    /// Optional cap on this account's balance. `None` means unlimited.
    #[serde(default)]
    pub account_target: Option<Decimal>,
}

fn default_weight() -> Decimal {
    Decimal::ONE
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            balance: Decimal::ZERO,
            apy_pct: Decimal::ZERO,
            notes: String::new(),
            alloc_weight: default_weight(),
            account_target: None,
        }
    }
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }
    pub fn with_apy(mut self, apy_pct: Decimal) -> Self {
        self.apy_pct = apy_pct;
        self
    }
    pub fn with_weight(mut self, alloc_weight: Decimal) -> Self {
        self.alloc_weight = alloc_weight;
        self
    }
    pub fn with_target(mut self, account_target: Decimal) -> Self {
        self.account_target = Some(account_target);
        self
    }
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// How much more this account can take before hitting its cap.
    /// `None` stands for unlimited room.
    pub fn remaining_room(&self) -> Option<Decimal> {
        self.account_target
            .map(|target| (target - self.balance).max(Decimal::ZERO))
    }

    /// Weight used for proportional splits; non-positive weights count as zero.
    pub fn effective_weight(&self) -> Decimal {
        self.alloc_weight.max(Decimal::ZERO)
    }
}

/// A prioritized bucket of accounts with a funding target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub purpose: String,
    pub target: Decimal,
    /// Lower value is funded first.
    pub priority: i64,
    #[serde(default)]
    pub preferred_account: Option<String>,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Tier {
    pub fn new(
        name: impl Into<String>,
        purpose: impl Into<String>,
        target: Decimal,
        priority: i64,
    ) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.into(),
            target,
            priority,
            preferred_account: None,
            accounts: Vec::new(),
        }
    }
    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }
    pub fn with_preferred(mut self, account_name: impl Into<String>) -> Self {
        self.preferred_account = Some(account_name.into());
        self
    }

    pub fn total(&self) -> Decimal {
        self.accounts.iter().map(|account| account.balance).sum()
    }
    /// Shortfall below target, zero once the target is met.
    pub fn gap(&self) -> Decimal {
        (self.target - self.total()).max(Decimal::ZERO)
    }
    /// Amount held above target, zero while underfunded.
    pub fn excess(&self) -> Decimal {
        (self.total() - self.target).max(Decimal::ZERO)
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.name == name)
    }

    /// Resolves the preferred account by name. A name that no longer matches
    /// any account resolves to `None`.
    pub fn preferred(&self) -> Option<&Account> {
        self.preferred_account
            .as_deref()
            .and_then(|name| self.account(name))
    }

    /// Catch-all tier for cash left over once every target is met.
    pub fn is_growth(&self) -> bool {
        self.name.contains("Tier 4") || self.purpose.to_lowercase().contains("growth")
    }

    /// Returns the named account, appending an empty one if it does not exist yet.
    pub fn upsert_account(&mut self, name: &str) -> &mut Account {
        let index = match self.accounts.iter().position(|account| account.name == name) {
            Some(index) => index,
            None => {
                self.accounts.push(Account::new(name));
                self.accounts.len() - 1
            }
        };
        &mut self.accounts[index]
    }

    pub fn set_preferred(&mut self, account_name: Option<&str>) -> Result<(), DomainError> {
        if let Some(name) = account_name
            && self.account(name).is_none()
        {
            return Err(DomainError::AccountNotFound {
                tier: self.name.clone(),
                account: name.to_owned(),
            });
        }
        self.preferred_account = account_name.map(str::to_owned);
        Ok(())
    }
}

/// The root aggregate: every tier the user manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub tiers: Vec<Tier>,
    #[serde(
        default = "Utc::now",
        deserialize_with = "crate::parsing::flexible_timestamp"
    )]
    pub last_updated: DateTime<Utc>,
}

impl Default for Plan {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Plan {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self {
            tiers,
            last_updated: Utc::now(),
        }
    }

    pub fn total_reserves(&self) -> Decimal {
        self.tiers.iter().map(Tier::total).sum()
    }

    /// Tiers by ascending priority. Equal priorities keep their plan order.
    pub fn sorted_by_priority(&self) -> Vec<&Tier> {
        let mut tiers: Vec<&Tier> = self.tiers.iter().collect();
        tiers.sort_by_key(|tier| tier.priority);
        tiers
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.name == name)
    }

    pub fn try_tier(&self, name: &str) -> Result<&Tier, DomainError> {
        self.tier(name)
            .ok_or_else(|| DomainError::TierNotFound(name.to_owned()))
    }

    pub fn try_tier_mut(&mut self, name: &str) -> Result<&mut Tier, DomainError> {
        self.tiers
            .iter_mut()
            .find(|tier| tier.name == name)
            .ok_or_else(|| DomainError::TierNotFound(name.to_owned()))
    }

    pub fn account_mut(
        &mut self,
        tier_name: &str,
        account_name: &str,
    ) -> Result<&mut Account, DomainError> {
        self.try_tier_mut(tier_name)?
            .accounts
            .iter_mut()
            .find(|account| account.name == account_name)
            .ok_or_else(|| DomainError::AccountNotFound {
                tier: tier_name.to_owned(),
                account: account_name.to_owned(),
            })
    }

    /// First tier in priority order that qualifies as the growth tier.
    pub fn growth_tier(&self) -> Option<&Tier> {
        self.sorted_by_priority()
            .into_iter()
            .find(|tier| tier.is_growth())
    }

    pub fn add_tier(&mut self, tier: Tier) -> Result<(), DomainError> {
        if self.tier(&tier.name).is_some() {
            return Err(DomainError::DuplicateTier(tier.name));
        }
        self.tiers.push(tier);
        Ok(())
    }

    pub fn remove_tier(&mut self, name: &str) -> Result<Tier, DomainError> {
        let index = self
            .tiers
            .iter()
            .position(|tier| tier.name == name)
            .ok_or_else(|| DomainError::TierNotFound(name.to_owned()))?;
        Ok(self.tiers.remove(index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    #[display("allocation")]
    Allocation,
    #[display("rebalance")]
    Rebalance,
    #[display("manual")]
    Manual,
    #[display("recurring")]
    Recurring,
}

/// One balance change on one account, as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "tier")]
    pub tier_name: String,
    #[serde(rename = "account")]
    pub account_name: String,
    /// Positive for inflows, negative for outflows.
    pub amount: Decimal,
    pub balance_after: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub user: String,
}

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[display("daily")]
    Daily,
    #[display("weekly")]
    Weekly,
    #[display("biweekly")]
    Biweekly,
    #[display("monthly")]
    Monthly,
    #[display("quarterly")]
    Quarterly,
    #[display("annually")]
    Annually,
}

impl Frequency {
    /// The occurrence after `date`. Month-based steps that land past the end
    /// of a shorter month use its last day, so Jan 31 is followed by Feb 28
    /// (or 29). `None` only when the calendar runs out.
    pub fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => date.checked_add_signed(Duration::days(1)),
            Self::Weekly => date.checked_add_signed(Duration::days(7)),
            Self::Biweekly => date.checked_add_signed(Duration::days(14)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::Annually => date.checked_add_months(Months::new(12)),
        }
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annually" | "yearly" => Ok(Self::Annually),
            _ => Err(DomainError::UnknownFrequency(s.to_owned())),
        }
    }
}

/// A scheduled deposit (positive) or withdrawal (negative) on one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub name: String,
    pub tier_name: String,
    pub account_name: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub next_date: NaiveDate,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

fn default_enabled() -> bool {
    true
}

impl RecurringTransaction {
    pub fn new(
        name: impl Into<String>,
        tier_name: impl Into<String>,
        account_name: impl Into<String>,
        amount: Decimal,
        frequency: Frequency,
        next_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            tier_name: tier_name.into(),
            account_name: account_name.into(),
            amount,
            frequency,
            next_date,
            enabled: true,
            description: String::new(),
        }
    }
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.enabled && self.next_date <= today
    }
}
