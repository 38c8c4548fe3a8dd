//! Trading domain engine.
//!
//! Business rules for the single-player commodity market, implemented purely
//! as deterministic domain logic (no IO, no storage). The only impure piece
//! is the price generator, and its random source is injected.

pub mod distribution;
pub mod inventory;
pub mod item;
pub mod player;
pub mod pricing;
pub mod snapshot;

pub use distribution::{DistributionRecord, TradeDirection};
pub use inventory::InventoryLine;
pub use item::Item;
pub use player::{
    AddDailyPrice, BalancePolicy, BuyItem, BuyOutcome, ClearDailyPrices, CreatePlayer,
    DailyPriceAdded, DailyPricesCleared, ItemBought, ItemSold, Player, PlayerCommand,
    PlayerCreated, PlayerEvent, PlayerId, SellItem,
};
pub use pricing::{GeneratedPrice, PriceDirection, PriceGenerator};
pub use snapshot::DailyPriceSnapshot;
