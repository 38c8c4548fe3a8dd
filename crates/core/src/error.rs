//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic business failure with a stable code
/// (see [`DomainError::code`]). Storage and transport failures are modelled
/// by the infrastructure layer and never end up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("name cannot be empty")]
    NameEmpty,

    #[error("description cannot be empty")]
    DescriptionEmpty,

    #[error("base price must be greater than zero and expressed in whole cents")]
    BasePriceInvalid,

    #[error("volatility must be between 0 and 1")]
    VolatilityInvalid,

    #[error("balance cannot be negative")]
    BalanceNegative,

    #[error("price must be greater than zero")]
    PriceInvalid,

    #[error("daily price already exists for this item and date")]
    SnapshotAlreadyExists,

    #[error("quantity must be greater than zero")]
    QuantityInvalid,

    #[error("daily price not found for item")]
    PriceMissing,

    #[error("insufficient balance")]
    BalanceInsufficient,

    #[error("item not found in inventory")]
    InventoryNotFound,

    #[error("not enough quantity in inventory")]
    InventoryInsufficient,

    #[error("trade total must be greater than zero")]
    TotalInvalid,

    #[error("amount is out of range")]
    AmountOverflow,

    #[error("item reference cannot be empty")]
    ItemNull,

    #[error("player reference cannot be empty")]
    PlayerNull,

    #[error("aggregate already exists")]
    AlreadyCreated,

    #[error("aggregate does not exist")]
    NotCreated,

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NameEmpty => "Name.Empty",
            DomainError::DescriptionEmpty => "Item.Description.Empty",
            DomainError::BasePriceInvalid => "Item.BasePrice.Invalid",
            DomainError::VolatilityInvalid => "Item.Volatility.Invalid",
            DomainError::BalanceNegative => "Player.Balance.Negative",
            DomainError::PriceInvalid => "DailyPrice.Price.Invalid",
            DomainError::SnapshotAlreadyExists => "DailyPrice.Exists",
            DomainError::QuantityInvalid => "Inventory.Quantity.Invalid",
            DomainError::PriceMissing => "Player.DailyPrice.Missing",
            DomainError::BalanceInsufficient => "Player.Balance.Insufficient",
            DomainError::InventoryNotFound => "Inventory.NotFound",
            DomainError::InventoryInsufficient => "Inventory.Quantity.Insufficient",
            DomainError::TotalInvalid => "DistributionRecord.PriceTotal.Invalid",
            DomainError::AmountOverflow => "Amount.Overflow",
            DomainError::ItemNull => "Item.Null",
            DomainError::PlayerNull => "Player.Null",
            DomainError::AlreadyCreated => "Aggregate.AlreadyCreated",
            DomainError::NotCreated => "Aggregate.NotCreated",
            DomainError::InvalidId(_) => "Id.Invalid",
            DomainError::Conflict(_) => "Aggregate.Version.Conflict",
        }
    }
}
