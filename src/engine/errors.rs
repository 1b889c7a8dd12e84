use rust_decimal::Decimal;

use crate::domain::DomainError;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Cannot withdraw {needed} from {tier}: only {available} available")]
    InsufficientFunds {
        tier: String,
        needed: Decimal,
        available: Decimal,
    },
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
}
