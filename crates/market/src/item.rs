use rust_decimal::Decimal;
use serde::Serialize;

use tradepost_core::{DomainError, DomainResult, Entity, ItemId};

/// Catalog item: an immutable tradable good.
///
/// Items are created by an administrative action and only ever referenced by
/// id from the player aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    name: String,
    description: String,
    base_price: Decimal,
    volatility: Decimal,
}

impl Item {
    /// Validate and build a catalog item.
    ///
    /// `base_price` must be positive with at most two decimal places;
    /// `volatility` must lie in `[0, 1]`.
    pub fn create(
        id: ItemId,
        name: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        volatility: Decimal,
    ) -> DomainResult<Self> {
        if id.is_nil() {
            return Err(DomainError::ItemNull);
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::NameEmpty);
        }

        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::DescriptionEmpty);
        }

        if base_price <= Decimal::ZERO || base_price.normalize().scale() > 2 {
            return Err(DomainError::BasePriceInvalid);
        }

        if volatility < Decimal::ZERO || volatility > Decimal::ONE {
            return Err(DomainError::VolatilityInvalid);
        }

        // The upper edge of the price band must stay representable.
        if base_price.checked_mul(Decimal::ONE + volatility).is_none() {
            return Err(DomainError::BasePriceInvalid);
        }

        Ok(Self {
            id,
            name,
            description,
            base_price,
            volatility,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn volatility(&self) -> Decimal {
        self.volatility
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
