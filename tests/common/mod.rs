use chrono::{TimeZone, Utc};
use reserve_tiers::{
    domain::{Account, Plan, Tier},
    engine::ApplyContext,
};
use rust_decimal::Decimal;

#[allow(dead_code)]
pub fn tier(name: &str, target: Decimal, priority: i64, accounts: Vec<Account>) -> Tier {
    accounts
        .into_iter()
        .fold(Tier::new(name, "", target, priority), Tier::with_account)
}

#[allow(dead_code)]
pub fn funded(name: &str, balance: Decimal) -> Account {
    Account::new(name).with_balance(balance)
}

#[allow(dead_code)]
pub fn plan(tiers: Vec<Tier>) -> Plan {
    Plan::new(tiers)
}

#[allow(dead_code)]
pub fn context() -> ApplyContext {
    ApplyContext::at("tester", Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
}
