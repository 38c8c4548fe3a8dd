use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradepost_core::{DistributionRecordId, DomainError, DomainResult, Entity, ItemId};

use crate::player::PlayerId;

/// Whether a trade moved goods into (`BUY`) or out of (`SELL`) the inventory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

/// Immutable ledger entry of a completed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    id: DistributionRecordId,
    item_id: ItemId,
    player_id: PlayerId,
    total: Decimal,
    direction: TradeDirection,
    created_at: DateTime<Utc>,
}

impl DistributionRecord {
    pub fn new(
        id: DistributionRecordId,
        item_id: ItemId,
        player_id: PlayerId,
        total: Decimal,
        direction: TradeDirection,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if item_id.is_nil() {
            return Err(DomainError::ItemNull);
        }
        if player_id.is_nil() {
            return Err(DomainError::PlayerNull);
        }
        if total <= Decimal::ZERO {
            return Err(DomainError::TotalInvalid);
        }

        Ok(Self::restore(id, item_id, player_id, total, direction, created_at))
    }

    pub(crate) fn restore(
        id: DistributionRecordId,
        item_id: ItemId,
        player_id: PlayerId,
        total: Decimal,
        direction: TradeDirection,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id,
            player_id,
            total,
            direction,
            created_at,
        }
    }

    pub fn id_typed(&self) -> DistributionRecordId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn direction(&self) -> TradeDirection {
        self.direction
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for DistributionRecord {
    type Id = DistributionRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradepost_core::AggregateId;

    #[test]
    fn zero_total_is_rejected() {
        let err = DistributionRecord::new(
            DistributionRecordId::new(),
            ItemId::new(),
            PlayerId::new(AggregateId::new()),
            dec!(0),
            TradeDirection::Buy,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::TotalInvalid);
    }

    #[test]
    fn empty_player_reference_is_rejected() {
        let err = DistributionRecord::new(
            DistributionRecordId::new(),
            ItemId::new(),
            PlayerId::new(AggregateId::nil()),
            dec!(10),
            TradeDirection::Sell,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, DomainError::PlayerNull);
    }

    #[test]
    fn direction_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeDirection::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&TradeDirection::Sell).unwrap(), "\"SELL\"");
    }
}
