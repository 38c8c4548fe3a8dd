use serde::{Deserialize, Serialize};

use tradepost_core::{Entity, InventoryLineId, ItemId};

use crate::player::PlayerId;

/// Quantity of one item currently held by a player.
///
/// Only the owning [`Player`](crate::Player) changes a line; a line whose
/// quantity drops to zero is removed from the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    id: InventoryLineId,
    player_id: PlayerId,
    item_id: ItemId,
    quantity: i64,
}

impl InventoryLine {
    pub(crate) fn open(
        id: InventoryLineId,
        player_id: PlayerId,
        item_id: ItemId,
        quantity: i64,
    ) -> Self {
        Self {
            id,
            player_id,
            item_id,
            quantity,
        }
    }

    pub fn id_typed(&self) -> InventoryLineId {
        self.id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn has_enough(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    pub(crate) fn increase(&mut self, quantity: i64) {
        self.quantity += quantity;
    }

    pub(crate) fn decrease(&mut self, quantity: i64) {
        self.quantity -= quantity;
    }
}

impl Entity for InventoryLine {
    type Id = InventoryLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
