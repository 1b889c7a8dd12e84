//! Plan and ledger deserialization.
//!
//! Plans are JSON documents. Missing fields fall back to defaults, so older
//! plan files (numeric amounts, date-only `last_updated`,
//! accounts without weights) still load.
//!
//! The ledger is a CSV file; malformed rows are logged and skipped.
//!
//! Recurring schedules live in their own JSON file, a plain array.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::domain::{Plan, RecurringTransaction, Transaction};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Plan not found at {}. Run 'init' first.", .0.display())]
    PlanNotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid ledger: {0}")]
    Csv(#[from] csv::Error),
}

pub fn read_plan(reader: impl Read) -> Result<Plan, ParseError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn load_plan(path: &Path) -> Result<Plan, ParseError> {
    if !path.exists() {
        return Err(ParseError::PlanNotFound(path.to_owned()));
    }
    let plan = read_plan(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), tiers = plan.tiers.len(), "loaded plan");
    Ok(plan)
}

pub fn read_schedules(reader: impl Read) -> Result<Vec<RecurringTransaction>, ParseError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Loads recurring schedules. A missing file means none are set up yet.
pub fn load_schedules(path: &Path) -> Result<Vec<RecurringTransaction>, ParseError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let schedules = read_schedules(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), count = schedules.len(), "loaded recurring schedules");
    Ok(schedules)
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn flexible_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(serde::de::Error::custom)
}

/// Lazily deserializes ledger rows, skipping any that fail to parse.
pub fn deserialize_ledger<D: Read>(
    reader: &mut csv::Reader<D>,
) -> impl Iterator<Item = Transaction> {
    reader
        .deserialize::<Transaction>()
        .filter_map(|result| match result {
            Ok(transaction) => Some(transaction),
            Err(e) => {
                warn!("Failed to parse ledger row: {e}");
                None
            }
        })
}

/// Reads the ledger at `path`, keeping rows that match the optional tier and
/// account filters and were recorded after `since`. A missing ledger reads as
/// empty.
pub fn read_ledger(
    path: &Path,
    tier: Option<&str>,
    account: Option<&str>,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Transaction>, ParseError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    Ok(deserialize_ledger(&mut rdr)
        .filter(|transaction| tier.is_none_or(|tier| transaction.tier_name == tier))
        .filter(|transaction| account.is_none_or(|account| transaction.account_name == account))
        .filter(|transaction| since.is_none_or(|since| transaction.timestamp > since))
        .collect())
}
