//! Read views of the market.
//!
//! Each view has a dedicated mapping function from domain state; item
//! details are joined from the catalog by id.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use tradepost_core::{InventoryLineId, ItemId, SnapshotId};
use tradepost_market::{DailyPriceSnapshot, InventoryLine, Item, Player, PlayerId, PriceDirection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub volatility: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPriceView {
    pub id: SnapshotId,
    /// `None` when the item has since left the catalog.
    pub item: Option<ItemView>,
    pub price: Decimal,
    pub percentage: Decimal,
    pub date: NaiveDate,
    pub direction: PriceDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryView {
    pub id: InventoryLineId,
    pub item: Option<ItemView>,
    pub quantity: i64,
}

/// Inventory line after a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseView {
    pub line: InventoryView,
    pub was_new_line: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub balance: Decimal,
    /// Only the snapshots dated `today`.
    pub daily_prices: Vec<DailyPriceView>,
    pub inventory: Vec<InventoryView>,
}

pub fn item_view(item: &Item) -> ItemView {
    ItemView {
        id: item.id_typed(),
        name: item.name().to_string(),
        description: item.description().to_string(),
        base_price: item.base_price(),
        volatility: item.volatility(),
    }
}

pub fn daily_price_view(snapshot: &DailyPriceSnapshot, item: Option<&Item>) -> DailyPriceView {
    DailyPriceView {
        id: snapshot.id_typed(),
        item: item.map(item_view),
        price: snapshot.price(),
        percentage: snapshot.percentage(),
        date: snapshot.date(),
        direction: snapshot.direction(),
    }
}

pub fn inventory_view(line: &InventoryLine, item: Option<&Item>) -> InventoryView {
    InventoryView {
        id: line.id_typed(),
        item: item.map(item_view),
        quantity: line.quantity(),
    }
}

pub fn player_view(player: &Player, items: &[Item], today: NaiveDate) -> PlayerView {
    let by_id: HashMap<ItemId, &Item> = items.iter().map(|i| (i.id_typed(), i)).collect();
    let lookup = |id: ItemId| by_id.get(&id).copied();

    PlayerView {
        id: player.id_typed(),
        name: player.name().to_string(),
        balance: player.balance(),
        daily_prices: player
            .daily_prices()
            .iter()
            .filter(|p| p.date() == today)
            .map(|p| daily_price_view(p, lookup(p.item_id())))
            .collect(),
        inventory: player
            .inventory()
            .iter()
            .map(|l| inventory_view(l, lookup(l.item_id())))
            .collect(),
    }
}
