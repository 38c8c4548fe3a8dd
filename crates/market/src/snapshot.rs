use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradepost_core::{DomainError, DomainResult, Entity, ItemId, SnapshotId};

use crate::player::PlayerId;
use crate::pricing::PriceDirection;

/// The generated price of one item, for one player, on one calendar day.
///
/// Snapshots are never mutated; a new trading day supersedes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPriceSnapshot {
    id: SnapshotId,
    item_id: ItemId,
    player_id: PlayerId,
    date: NaiveDate,
    price: Decimal,
    percentage: Decimal,
    direction: PriceDirection,
}

impl DailyPriceSnapshot {
    pub fn new(
        id: SnapshotId,
        item_id: ItemId,
        player_id: PlayerId,
        date: NaiveDate,
        price: Decimal,
        percentage: Decimal,
        direction: PriceDirection,
    ) -> DomainResult<Self> {
        if item_id.is_nil() {
            return Err(DomainError::ItemNull);
        }
        if player_id.is_nil() {
            return Err(DomainError::PlayerNull);
        }
        if price <= Decimal::ZERO {
            return Err(DomainError::PriceInvalid);
        }

        Ok(Self::restore(id, item_id, player_id, date, price, percentage, direction))
    }

    /// Rebuild a snapshot from a recorded event; guards ran when it was recorded.
    pub(crate) fn restore(
        id: SnapshotId,
        item_id: ItemId,
        player_id: PlayerId,
        date: NaiveDate,
        price: Decimal,
        percentage: Decimal,
        direction: PriceDirection,
    ) -> Self {
        Self {
            id,
            item_id,
            player_id,
            date,
            price,
            percentage,
            direction,
        }
    }

    pub fn id_typed(&self) -> SnapshotId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    pub fn direction(&self) -> PriceDirection {
        self.direction
    }
}

impl Entity for DailyPriceSnapshot {
    type Id = SnapshotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
