//! Tiered cash reserves.
//!
//! A [`Plan`](domain::Plan) holds prioritized tiers, each with a target and a
//! set of accounts. The [`engine`] decides where new cash should go, which
//! transfers would even out over- and underfunded tiers, and how much interest
//! the reserves should earn. [`parsing`] and [`output`] move plans and the
//! transaction ledger to and from disk.

pub mod defaults;
pub mod domain;
pub mod engine;
pub mod output;
pub mod parsing;
