use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tradepost_core::{
    Aggregate, AggregateId, AggregateRoot, DistributionRecordId, DomainError, DomainResult, Entity,
    Event, InventoryLineId, ItemId, SnapshotId,
};

use crate::distribution::{DistributionRecord, TradeDirection};
use crate::inventory::InventoryLine;
use crate::item::Item;
use crate::pricing::{GeneratedPrice, PriceDirection};
use crate::snapshot::DailyPriceSnapshot;

/// Player identifier (aggregate id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub AggregateId);

impl PlayerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Whether a player may start with a negative balance.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    AllowNegative,
    #[default]
    RejectNegative,
}

/// Aggregate root: Player.
///
/// Owns the balance, the daily price snapshots, the inventory lines and the
/// trade ledger. Children hold the player's id, never a reference back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    balance: Decimal,
    daily_prices: Vec<DailyPriceSnapshot>,
    inventory: Vec<InventoryLine>,
    ledger: Vec<DistributionRecord>,
    version: u64,
    created: bool,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyOutcome {
    pub line: InventoryLine,
    /// `true` when the purchase opened a new inventory line.
    pub was_new_line: bool,
}

impl Player {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PlayerId) -> Self {
        Self {
            id,
            name: String::new(),
            balance: Decimal::ZERO,
            daily_prices: Vec::new(),
            inventory: Vec::new(),
            ledger: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn daily_prices(&self) -> &[DailyPriceSnapshot] {
        &self.daily_prices
    }

    pub fn inventory(&self) -> &[InventoryLine] {
        &self.inventory
    }

    pub fn ledger(&self) -> &[DistributionRecord] {
        &self.ledger
    }

    /// The live snapshot for an item: the one with the latest date.
    pub fn daily_price(&self, item_id: ItemId) -> Option<&DailyPriceSnapshot> {
        self.daily_prices
            .iter()
            .filter(|p| p.item_id() == item_id)
            .max_by_key(|p| p.date())
    }

    pub fn has_prices_for(&self, date: NaiveDate) -> bool {
        self.daily_prices.iter().any(|p| p.date() == date)
    }

    pub fn inventory_line(&self, item_id: ItemId) -> Option<&InventoryLine> {
        self.inventory.iter().find(|l| l.item_id() == item_id)
    }

    fn has_daily_price(&self, item_id: ItemId, date: NaiveDate) -> bool {
        self.daily_prices
            .iter()
            .any(|p| p.item_id() == item_id && p.date() == date)
    }
}

impl AggregateRoot for Player {
    type Id = PlayerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePlayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub balance: Decimal,
    pub policy: BalancePolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddDailyPrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDailyPrice {
    pub player_id: PlayerId,
    pub snapshot_id: SnapshotId,
    pub item_id: ItemId,
    pub date: NaiveDate,
    pub price: Decimal,
    pub percentage: Decimal,
    pub direction: PriceDirection,
    pub occurred_at: DateTime<Utc>,
}

impl AddDailyPrice {
    pub fn new(
        player_id: PlayerId,
        item: &Item,
        date: NaiveDate,
        generated: GeneratedPrice,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            player_id,
            snapshot_id: SnapshotId::new(),
            item_id: item.id_typed(),
            date,
            price: generated.price,
            percentage: generated.percentage,
            direction: generated.direction,
            occurred_at,
        }
    }
}

/// Command: ClearDailyPrices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearDailyPrices {
    pub player_id: PlayerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: BuyItem.
///
/// `line_id` is only used when the purchase opens a new inventory line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyItem {
    pub player_id: PlayerId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub line_id: InventoryLineId,
    pub record_id: DistributionRecordId,
    pub occurred_at: DateTime<Utc>,
}

impl BuyItem {
    pub fn new(player_id: PlayerId, item_id: ItemId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            player_id,
            item_id,
            quantity,
            line_id: InventoryLineId::new(),
            record_id: DistributionRecordId::new(),
            occurred_at,
        }
    }
}

/// Command: SellItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellItem {
    pub player_id: PlayerId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub record_id: DistributionRecordId,
    pub occurred_at: DateTime<Utc>,
}

impl SellItem {
    pub fn new(player_id: PlayerId, item_id: ItemId, quantity: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            player_id,
            item_id,
            quantity,
            record_id: DistributionRecordId::new(),
            occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    CreatePlayer(CreatePlayer),
    AddDailyPrice(AddDailyPrice),
    ClearDailyPrices(ClearDailyPrices),
    BuyItem(BuyItem),
    SellItem(SellItem),
}

/// Event: PlayerCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCreated {
    pub player_id: PlayerId,
    pub name: String,
    pub balance: Decimal,
    pub occurred_at: DateTime<Utc>,
}

impl PlayerCreated {
    pub const EVENT_TYPE: &'static str = "market.player.created";
}

/// Event: DailyPriceAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPriceAdded {
    pub player_id: PlayerId,
    pub snapshot_id: SnapshotId,
    pub item_id: ItemId,
    pub date: NaiveDate,
    pub price: Decimal,
    pub percentage: Decimal,
    pub direction: PriceDirection,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DailyPricesCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPricesCleared {
    pub player_id: PlayerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemBought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBought {
    pub player_id: PlayerId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
    pub line_id: InventoryLineId,
    pub line_created: bool,
    pub record_id: DistributionRecordId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSold {
    pub player_id: PlayerId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub revenue: Decimal,
    pub line_id: InventoryLineId,
    pub record_id: DistributionRecordId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerEvent {
    PlayerCreated(PlayerCreated),
    DailyPriceAdded(DailyPriceAdded),
    DailyPricesCleared(DailyPricesCleared),
    ItemBought(ItemBought),
    ItemSold(ItemSold),
}

impl Event for PlayerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlayerCreated(_) => PlayerCreated::EVENT_TYPE,
            PlayerEvent::DailyPriceAdded(_) => "market.player.daily_price_added",
            PlayerEvent::DailyPricesCleared(_) => "market.player.daily_prices_cleared",
            PlayerEvent::ItemBought(_) => "market.player.item_bought",
            PlayerEvent::ItemSold(_) => "market.player.item_sold",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlayerEvent::PlayerCreated(e) => e.occurred_at,
            PlayerEvent::DailyPriceAdded(e) => e.occurred_at,
            PlayerEvent::DailyPricesCleared(e) => e.occurred_at,
            PlayerEvent::ItemBought(e) => e.occurred_at,
            PlayerEvent::ItemSold(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Player {
    type Command = PlayerCommand;
    type Event = PlayerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PlayerEvent::PlayerCreated(e) => {
                self.id = e.player_id;
                self.name = e.name.clone();
                self.balance = e.balance;
                self.daily_prices.clear();
                self.inventory.clear();
                self.ledger.clear();
                self.created = true;
            }
            PlayerEvent::DailyPriceAdded(e) => {
                self.daily_prices.push(DailyPriceSnapshot::restore(
                    e.snapshot_id,
                    e.item_id,
                    e.player_id,
                    e.date,
                    e.price,
                    e.percentage,
                    e.direction,
                ));
            }
            PlayerEvent::DailyPricesCleared(_) => {
                self.daily_prices.clear();
            }
            PlayerEvent::ItemBought(e) => {
                self.balance -= e.total_cost;
                match self.inventory.iter_mut().find(|l| l.item_id() == e.item_id) {
                    Some(line) => line.increase(e.quantity),
                    None => self.inventory.push(InventoryLine::open(
                        e.line_id,
                        e.player_id,
                        e.item_id,
                        e.quantity,
                    )),
                }
                self.ledger.push(DistributionRecord::restore(
                    e.record_id,
                    e.item_id,
                    e.player_id,
                    e.total_cost,
                    TradeDirection::Buy,
                    e.occurred_at,
                ));
            }
            PlayerEvent::ItemSold(e) => {
                self.balance += e.revenue;
                if let Some(idx) = self.inventory.iter().position(|l| l.item_id() == e.item_id) {
                    self.inventory[idx].decrease(e.quantity);
                    if self.inventory[idx].is_empty() {
                        self.inventory.remove(idx);
                    }
                }
                self.ledger.push(DistributionRecord::restore(
                    e.record_id,
                    e.item_id,
                    e.player_id,
                    e.revenue,
                    TradeDirection::Sell,
                    e.occurred_at,
                ));
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PlayerCommand::CreatePlayer(cmd) => self.handle_create(cmd),
            PlayerCommand::AddDailyPrice(cmd) => self.handle_add_daily_price(cmd),
            PlayerCommand::ClearDailyPrices(cmd) => self.handle_clear_daily_prices(cmd),
            PlayerCommand::BuyItem(cmd) => self.handle_buy(cmd),
            PlayerCommand::SellItem(cmd) => self.handle_sell(cmd),
        }
    }
}

impl Player {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::NotCreated);
        }
        Ok(())
    }

    fn ensure_player_id(&self, player_id: PlayerId) -> Result<(), DomainError> {
        if self.id != player_id {
            return Err(DomainError::invalid_id(format!(
                "command targets player {player_id}, aggregate is {}",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_quantity(quantity: i64) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::QuantityInvalid);
        }
        Ok(())
    }

    fn live_price(&self, item_id: ItemId) -> Result<Decimal, DomainError> {
        self.daily_price(item_id)
            .map(|p| p.price())
            .ok_or(DomainError::PriceMissing)
    }

    fn handle_create(&self, cmd: &CreatePlayer) -> Result<Vec<PlayerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::AlreadyCreated);
        }
        if cmd.player_id.is_nil() {
            return Err(DomainError::PlayerNull);
        }

        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::NameEmpty);
        }

        if cmd.policy == BalancePolicy::RejectNegative && cmd.balance < Decimal::ZERO {
            return Err(DomainError::BalanceNegative);
        }

        Ok(vec![PlayerEvent::PlayerCreated(PlayerCreated {
            player_id: cmd.player_id,
            name: name.to_string(),
            balance: cmd.balance,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_daily_price(&self, cmd: &AddDailyPrice) -> Result<Vec<PlayerEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_player_id(cmd.player_id)?;

        if cmd.price <= Decimal::ZERO {
            return Err(DomainError::PriceInvalid);
        }

        if self.has_daily_price(cmd.item_id, cmd.date) {
            return Err(DomainError::SnapshotAlreadyExists);
        }

        // Runs the snapshot's own construction guards.
        let snapshot = DailyPriceSnapshot::new(
            cmd.snapshot_id,
            cmd.item_id,
            cmd.player_id,
            cmd.date,
            cmd.price,
            cmd.percentage,
            cmd.direction,
        )?;

        Ok(vec![PlayerEvent::DailyPriceAdded(DailyPriceAdded {
            player_id: snapshot.player_id(),
            snapshot_id: snapshot.id_typed(),
            item_id: snapshot.item_id(),
            date: snapshot.date(),
            price: snapshot.price(),
            percentage: snapshot.percentage(),
            direction: snapshot.direction(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear_daily_prices(
        &self,
        cmd: &ClearDailyPrices,
    ) -> Result<Vec<PlayerEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_player_id(cmd.player_id)?;

        if self.daily_prices.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![PlayerEvent::DailyPricesCleared(DailyPricesCleared {
            player_id: cmd.player_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_buy(&self, cmd: &BuyItem) -> Result<Vec<PlayerEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_player_id(cmd.player_id)?;
        Self::ensure_quantity(cmd.quantity)?;

        let unit_price = self.live_price(cmd.item_id)?;
        let total_cost = unit_price
            .checked_mul(Decimal::from(cmd.quantity))
            .ok_or(DomainError::AmountOverflow)?;

        if self.balance < total_cost {
            return Err(DomainError::BalanceInsufficient);
        }

        let (line_id, line_created) = match self.inventory_line(cmd.item_id) {
            Some(line) => {
                line.quantity()
                    .checked_add(cmd.quantity)
                    .ok_or(DomainError::AmountOverflow)?;
                (line.id_typed(), false)
            }
            None => (cmd.line_id, true),
        };

        Ok(vec![PlayerEvent::ItemBought(ItemBought {
            player_id: cmd.player_id,
            item_id: cmd.item_id,
            quantity: cmd.quantity,
            unit_price,
            total_cost,
            line_id,
            line_created,
            record_id: cmd.record_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sell(&self, cmd: &SellItem) -> Result<Vec<PlayerEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_player_id(cmd.player_id)?;
        Self::ensure_quantity(cmd.quantity)?;

        let unit_price = self.live_price(cmd.item_id)?;
        let revenue = unit_price
            .checked_mul(Decimal::from(cmd.quantity))
            .ok_or(DomainError::AmountOverflow)?;

        // Inventory is checked before any balance effect is decided.
        let line = self
            .inventory_line(cmd.item_id)
            .ok_or(DomainError::InventoryNotFound)?;
        if !line.has_enough(cmd.quantity) {
            return Err(DomainError::InventoryInsufficient);
        }

        self.balance
            .checked_add(revenue)
            .ok_or(DomainError::AmountOverflow)?;

        Ok(vec![PlayerEvent::ItemSold(ItemSold {
            player_id: cmd.player_id,
            item_id: cmd.item_id,
            quantity: cmd.quantity,
            unit_price,
            revenue,
            line_id: line.id_typed(),
            record_id: cmd.record_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Operation-shaped entry points (decide + apply).
impl Player {
    /// Create a new player with empty snapshot, inventory and ledger collections.
    pub fn create(cmd: CreatePlayer) -> DomainResult<Self> {
        let mut player = Self::empty(cmd.player_id);
        player.execute(&PlayerCommand::CreatePlayer(cmd))?;
        Ok(player)
    }

    pub fn add_daily_price(&mut self, cmd: AddDailyPrice) -> DomainResult<DailyPriceSnapshot> {
        let snapshot_id = cmd.snapshot_id;
        self.execute(&PlayerCommand::AddDailyPrice(cmd))?;
        self.daily_prices
            .iter()
            .find(|p| p.id() == &snapshot_id)
            .cloned()
            .ok_or(DomainError::PriceMissing)
    }

    /// Drop every stored snapshot (rolling over to a new trading day).
    pub fn clear_daily_prices(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<()> {
        let cmd = ClearDailyPrices {
            player_id: self.id,
            occurred_at,
        };
        self.execute(&PlayerCommand::ClearDailyPrices(cmd))?;
        Ok(())
    }

    pub fn buy_item(&mut self, cmd: BuyItem) -> DomainResult<BuyOutcome> {
        let events = self.execute(&PlayerCommand::BuyItem(cmd))?;
        events
            .iter()
            .find_map(|e| match e {
                PlayerEvent::ItemBought(bought) => self.bought_line(bought),
                _ => None,
            })
            .ok_or(DomainError::InventoryNotFound)
    }

    /// Sell units back to the market.
    ///
    /// Returns the line after the sale; a line sold down to zero has been
    /// removed from the aggregate and is returned with quantity 0.
    pub fn sell_item(&mut self, cmd: SellItem) -> DomainResult<InventoryLine> {
        let events = self.execute(&PlayerCommand::SellItem(cmd))?;
        events
            .iter()
            .find_map(|e| match e {
                PlayerEvent::ItemSold(sold) => Some(self.sold_line(sold)),
                _ => None,
            })
            .ok_or(DomainError::InventoryNotFound)
    }

    /// Outcome of an applied [`ItemBought`] event.
    pub fn bought_line(&self, event: &ItemBought) -> Option<BuyOutcome> {
        self.inventory_line(event.item_id).map(|line| BuyOutcome {
            line: line.clone(),
            was_new_line: event.line_created,
        })
    }

    /// Line state after an applied [`ItemSold`] event.
    pub fn sold_line(&self, event: &ItemSold) -> InventoryLine {
        self.inventory_line(event.item_id)
            .cloned()
            .unwrap_or_else(|| InventoryLine::open(event.line_id, self.id, event.item_id, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_player_id() -> PlayerId {
        PlayerId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn test_item(base: Decimal, vol: Decimal) -> Item {
        Item::create(ItemId::new(), "Sword", "A sturdy blade", base, vol).unwrap()
    }

    fn created_player(balance: Decimal) -> Player {
        Player::create(CreatePlayer {
            player_id: test_player_id(),
            name: "Kevin".to_string(),
            balance,
            policy: BalancePolicy::RejectNegative,
            occurred_at: test_time(),
        })
        .unwrap()
    }

    fn price_item(player: &mut Player, item: &Item, price: Decimal) {
        let generated = GeneratedPrice::fixed(item, price, PriceDirection::High);
        player
            .add_daily_price(AddDailyPrice::new(player.id_typed(), item, today(), generated, test_time()))
            .unwrap();
    }

    fn buy(player: &mut Player, item: &Item, quantity: i64) -> DomainResult<BuyOutcome> {
        player.buy_item(BuyItem::new(player.id_typed(), item.id_typed(), quantity, test_time()))
    }

    fn sell(player: &mut Player, item: &Item, quantity: i64) -> DomainResult<InventoryLine> {
        player.sell_item(SellItem::new(player.id_typed(), item.id_typed(), quantity, test_time()))
    }

    #[test]
    fn create_with_valid_parameters_starts_empty() {
        let player = created_player(dec!(100));
        assert_eq!(player.name(), "Kevin");
        assert_eq!(player.balance(), dec!(100));
        assert!(player.daily_prices().is_empty());
        assert!(player.inventory().is_empty());
        assert!(player.ledger().is_empty());
        assert_eq!(player.version(), 1);
    }

    #[test]
    fn create_with_blank_name_fails() {
        for name in ["", " ", "\t"] {
            let err = Player::create(CreatePlayer {
                player_id: test_player_id(),
                name: name.to_string(),
                balance: dec!(0),
                policy: BalancePolicy::AllowNegative,
                occurred_at: test_time(),
            })
            .unwrap_err();
            assert_eq!(err, DomainError::NameEmpty);
        }
    }

    #[test]
    fn negative_balance_follows_policy() {
        let mut cmd = CreatePlayer {
            player_id: test_player_id(),
            name: "Bob".to_string(),
            balance: dec!(-50),
            policy: BalancePolicy::AllowNegative,
            occurred_at: test_time(),
        };
        assert_eq!(Player::create(cmd.clone()).unwrap().balance(), dec!(-50));

        cmd.policy = BalancePolicy::RejectNegative;
        assert_eq!(Player::create(cmd).unwrap_err(), DomainError::BalanceNegative);
    }

    #[test]
    fn creating_twice_is_rejected() {
        let player = created_player(dec!(10));
        let cmd = PlayerCommand::CreatePlayer(CreatePlayer {
            player_id: player.id_typed(),
            name: "Again".to_string(),
            balance: dec!(10),
            policy: BalancePolicy::RejectNegative,
            occurred_at: test_time(),
        });
        assert_eq!(player.handle(&cmd).unwrap_err(), DomainError::AlreadyCreated);
    }

    #[test]
    fn commands_against_uncreated_player_fail() {
        let player = Player::empty(test_player_id());
        let cmd = PlayerCommand::BuyItem(BuyItem::new(player.id_typed(), ItemId::new(), 1, test_time()));
        assert_eq!(player.handle(&cmd).unwrap_err(), DomainError::NotCreated);
    }

    #[test]
    fn command_for_another_player_is_rejected() {
        let player = created_player(dec!(10));
        let cmd = PlayerCommand::BuyItem(BuyItem::new(test_player_id(), ItemId::new(), 1, test_time()));
        assert!(matches!(player.handle(&cmd), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn add_daily_price_stores_snapshot() {
        let mut player = created_player(dec!(10));
        let item = test_item(dec!(100), dec!(0.1));
        let generated = GeneratedPrice::fixed(&item, dec!(104.5), PriceDirection::High);
        let snapshot = player
            .add_daily_price(AddDailyPrice::new(player.id_typed(), &item, today(), generated, test_time()))
            .unwrap();

        assert_eq!(snapshot.price(), dec!(104.5));
        assert_eq!(snapshot.percentage(), dec!(4.5));
        assert_eq!(snapshot.player_id(), player.id_typed());
        assert_eq!(player.daily_price(item.id_typed()), Some(&snapshot));
        assert!(player.has_prices_for(today()));
    }

    #[test]
    fn add_daily_price_rejects_non_positive_price() {
        let mut player = created_player(dec!(10));
        let item = test_item(dec!(100), dec!(0.1));
        for price in [dec!(0), dec!(-1)] {
            let generated = GeneratedPrice::fixed(&item, price, PriceDirection::Low);
            let err = player
                .add_daily_price(AddDailyPrice::new(player.id_typed(), &item, today(), generated, test_time()))
                .unwrap_err();
            assert_eq!(err, DomainError::PriceInvalid);
        }
        assert!(player.daily_prices().is_empty());
    }

    #[test]
    fn second_snapshot_for_same_item_and_date_is_rejected() {
        let mut player = created_player(dec!(10));
        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));

        let other = GeneratedPrice::fixed(&item, dec!(91), PriceDirection::Low);
        let err = player
            .add_daily_price(AddDailyPrice::new(player.id_typed(), &item, today(), other, test_time()))
            .unwrap_err();
        assert_eq!(err, DomainError::SnapshotAlreadyExists);
        assert_eq!(player.daily_prices().len(), 1);
    }

    #[test]
    fn same_item_on_another_date_is_accepted_and_latest_is_live() {
        let mut player = created_player(dec!(10));
        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));

        let tomorrow = today().succ_opt().unwrap();
        let generated = GeneratedPrice::fixed(&item, dec!(107), PriceDirection::High);
        player
            .add_daily_price(AddDailyPrice::new(player.id_typed(), &item, tomorrow, generated, test_time()))
            .unwrap();

        assert_eq!(player.daily_price(item.id_typed()).unwrap().date(), tomorrow);
    }

    #[test]
    fn clear_daily_prices_removes_all_snapshots() {
        let mut player = created_player(dec!(10));
        price_item(&mut player, &test_item(dec!(100), dec!(0.1)), dec!(100));
        price_item(&mut player, &test_item(dec!(5), dec!(0.5)), dec!(6));

        player.clear_daily_prices(test_time()).unwrap();
        assert!(player.daily_prices().is_empty());
        assert!(!player.has_prices_for(today()));
    }

    #[test]
    fn clearing_without_prices_emits_nothing() {
        let player = created_player(dec!(10));
        let cmd = PlayerCommand::ClearDailyPrices(ClearDailyPrices {
            player_id: player.id_typed(),
            occurred_at: test_time(),
        });
        assert!(player.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn buying_five_at_one_hundred_debits_five_hundred() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));

        let outcome = buy(&mut player, &item, 5).unwrap();

        assert!(outcome.was_new_line);
        assert_eq!(outcome.line.quantity(), 5);
        assert_eq!(player.balance(), dec!(500));
        assert_eq!(player.ledger().len(), 1);
        assert_eq!(player.ledger()[0].direction(), TradeDirection::Buy);
        assert_eq!(player.ledger()[0].total(), dec!(500));
    }

    #[test]
    fn selling_everything_back_restores_balance_and_removes_line() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));
        buy(&mut player, &item, 5).unwrap();

        let line = sell(&mut player, &item, 5).unwrap();

        assert_eq!(line.quantity(), 0);
        assert_eq!(player.balance(), dec!(1000));
        assert!(player.inventory_line(item.id_typed()).is_none());
        assert_eq!(player.ledger().len(), 2);
        assert_eq!(player.ledger()[1].direction(), TradeDirection::Sell);
        assert_eq!(player.ledger()[1].total(), dec!(500));
    }

    #[test]
    fn second_purchase_extends_existing_line() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(10), dec!(0.1));
        price_item(&mut player, &item, dec!(10));

        let first = buy(&mut player, &item, 2).unwrap();
        let second = buy(&mut player, &item, 3).unwrap();

        assert!(!second.was_new_line);
        assert_eq!(second.line.id_typed(), first.line.id_typed());
        assert_eq!(second.line.quantity(), 5);
        assert_eq!(player.inventory().len(), 1);
    }

    #[test]
    fn partial_sale_keeps_line() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(10), dec!(0.1));
        price_item(&mut player, &item, dec!(10));
        buy(&mut player, &item, 4).unwrap();

        let line = sell(&mut player, &item, 1).unwrap();
        assert_eq!(line.quantity(), 3);
        assert_eq!(player.balance(), dec!(970));
    }

    #[test]
    fn buy_with_insufficient_balance_changes_nothing() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(50), dec!(0.1));
        price_item(&mut player, &item, dec!(50));
        let before = player.clone();

        let err = buy(&mut player, &item, 3).unwrap_err();

        assert_eq!(err, DomainError::BalanceInsufficient);
        assert_eq!(player, before);
    }

    #[test]
    fn buy_exactly_affordable_succeeds() {
        let mut player = created_player(dec!(150));
        let item = test_item(dec!(50), dec!(0.1));
        price_item(&mut player, &item, dec!(50));
        buy(&mut player, &item, 3).unwrap();
        assert_eq!(player.balance(), dec!(0));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(50), dec!(0.1));
        price_item(&mut player, &item, dec!(50));
        for qty in [0, -1] {
            assert_eq!(buy(&mut player, &item, qty).unwrap_err(), DomainError::QuantityInvalid);
            assert_eq!(sell(&mut player, &item, qty).unwrap_err(), DomainError::QuantityInvalid);
        }
    }

    #[test]
    fn trading_without_snapshot_reports_missing_price() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(50), dec!(0.1));
        assert_eq!(buy(&mut player, &item, 1).unwrap_err(), DomainError::PriceMissing);
        assert_eq!(sell(&mut player, &item, 1).unwrap_err(), DomainError::PriceMissing);
    }

    #[test]
    fn selling_without_line_fails_and_keeps_balance() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(50), dec!(0.1));
        price_item(&mut player, &item, dec!(50));

        let err = sell(&mut player, &item, 2).unwrap_err();

        assert_eq!(err, DomainError::InventoryNotFound);
        assert_eq!(player.balance(), dec!(100));
        assert!(player.ledger().is_empty());
    }

    #[test]
    fn overselling_fails_before_crediting() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(10), dec!(0.1));
        price_item(&mut player, &item, dec!(10));
        buy(&mut player, &item, 2).unwrap();
        let before = player.clone();

        let err = sell(&mut player, &item, 3).unwrap_err();

        assert_eq!(err, DomainError::InventoryInsufficient);
        assert_eq!(player, before);
    }

    #[test]
    fn oversized_order_reports_overflow() {
        let mut player = created_player(dec!(100));
        let item = test_item(dec!(10), dec!(0.1));
        let cmd = AddDailyPrice {
            player_id: player.id_typed(),
            snapshot_id: SnapshotId::new(),
            item_id: item.id_typed(),
            date: today(),
            price: Decimal::MAX,
            percentage: Decimal::ZERO,
            direction: PriceDirection::High,
            occurred_at: test_time(),
        };
        player.add_daily_price(cmd).unwrap();
        assert_eq!(buy(&mut player, &item, 2).unwrap_err(), DomainError::AmountOverflow);
    }

    #[test]
    fn version_increments_on_apply() {
        let mut player = created_player(dec!(1000));
        assert_eq!(player.version(), 1);

        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));
        assert_eq!(player.version(), 2);

        buy(&mut player, &item, 1).unwrap();
        assert_eq!(player.version(), 3);

        assert_eq!(
            buy(&mut player, &item, 100).unwrap_err(),
            DomainError::BalanceInsufficient
        );
        assert_eq!(player.version(), 3);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(100), dec!(0.1));
        price_item(&mut player, &item, dec!(100));
        let before = player.clone();

        let cmd = PlayerCommand::BuyItem(BuyItem::new(player.id_typed(), item.id_typed(), 2, test_time()));
        let events1 = player.handle(&cmd).unwrap();
        let events2 = player.handle(&cmd).unwrap();

        assert_eq!(player, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn apply_is_deterministic() {
        let player_id = test_player_id();
        let item_id = ItemId::new();
        let at = test_time();

        let events = vec![
            PlayerEvent::PlayerCreated(PlayerCreated {
                player_id,
                name: "Kevin".to_string(),
                balance: dec!(1000),
                occurred_at: at,
            }),
            PlayerEvent::DailyPriceAdded(DailyPriceAdded {
                player_id,
                snapshot_id: SnapshotId::new(),
                item_id,
                date: today(),
                price: dec!(100),
                percentage: dec!(0),
                direction: PriceDirection::High,
                occurred_at: at,
            }),
            PlayerEvent::ItemBought(ItemBought {
                player_id,
                item_id,
                quantity: 5,
                unit_price: dec!(100),
                total_cost: dec!(500),
                line_id: InventoryLineId::new(),
                line_created: true,
                record_id: DistributionRecordId::new(),
                occurred_at: at,
            }),
        ];

        let mut player1 = Player::empty(player_id);
        let mut player2 = Player::empty(player_id);
        for e in &events {
            player1.apply(e);
            player2.apply(e);
        }

        assert_eq!(player1, player2);
        assert_eq!(player1.balance(), dec!(500));
        assert_eq!(player1.version(), 3);
    }

    #[test]
    fn event_types_are_namespaced() {
        let e = PlayerEvent::DailyPricesCleared(DailyPricesCleared {
            player_id: test_player_id(),
            occurred_at: test_time(),
        });
        assert_eq!(e.event_type(), "market.player.daily_prices_cleared");
        assert_eq!(e.version(), 1);
    }

    #[test]
    fn events_survive_json_round_trip() {
        let mut player = created_player(dec!(1000));
        let item = test_item(dec!(12.50), dec!(0.1));
        price_item(&mut player, &item, dec!(12.50));
        let cmd = PlayerCommand::BuyItem(BuyItem::new(player.id_typed(), item.id_typed(), 3, test_time()));
        let events = player.handle(&cmd).unwrap();

        let json = serde_json::to_value(&events[0]).unwrap();
        let back: PlayerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, events[0]);
    }

    mod proptest_tests {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: buying q then selling q at the same price is balance-neutral.
            #[test]
            fn buy_then_sell_round_trip(
                price_cents in 1i64..1_000_000i64,
                quantity in 1i64..1_000i64,
                headroom_cents in 0i64..1_000_000i64,
            ) {
                let price = Decimal::new(price_cents, 2);
                let balance = price * Decimal::from(quantity) + Decimal::new(headroom_cents, 2);
                let mut player = created_player(balance);
                let item = test_item(dec!(1), dec!(0.5));
                price_item(&mut player, &item, price);

                buy(&mut player, &item, quantity).unwrap();
                sell(&mut player, &item, quantity).unwrap();

                prop_assert_eq!(player.balance(), balance);
                prop_assert!(player.inventory_line(item.id_typed()).is_none());
                prop_assert_eq!(player.ledger().len(), 2);
            }

            /// Property: a purchase never succeeds when it costs more than the balance.
            #[test]
            fn buy_never_overdraws(
                price_cents in 1i64..100_000i64,
                quantity in 1i64..100i64,
                balance_cents in 0i64..1_000_000i64,
            ) {
                let price = Decimal::new(price_cents, 2);
                let balance = Decimal::new(balance_cents, 2);
                let mut player = created_player(balance);
                let item = test_item(dec!(1), dec!(0.5));
                price_item(&mut player, &item, price);

                let result = buy(&mut player, &item, quantity);
                let cost = price * Decimal::from(quantity);
                if balance < cost {
                    prop_assert_eq!(result.unwrap_err(), DomainError::BalanceInsufficient);
                    prop_assert_eq!(player.balance(), balance);
                } else {
                    prop_assert!(result.is_ok());
                    prop_assert!(player.balance() >= Decimal::ZERO);
                }
            }

            /// Property: the ledger grows by exactly one per successful trade and never shrinks.
            #[test]
            fn ledger_is_append_only(
                ops in prop::collection::vec((any::<bool>(), 1i64..5i64), 1..40)
            ) {
                let mut player = created_player(dec!(200));
                let item = test_item(dec!(10), dec!(0.1));
                price_item(&mut player, &item, dec!(10));

                for (is_buy, quantity) in ops {
                    let held = player.inventory_line(item.id_typed()).map(|l| l.quantity()).unwrap_or(0);
                    let before = player.ledger().len();
                    let ok = if is_buy {
                        buy(&mut player, &item, quantity).is_ok()
                    } else {
                        sell(&mut player, &item, quantity).is_ok()
                    };
                    if !is_buy {
                        prop_assert_eq!(ok, held >= quantity);
                    }
                    let expected = if ok { before + 1 } else { before };
                    prop_assert_eq!(player.ledger().len(), expected);
                }
            }
        }
    }
}
