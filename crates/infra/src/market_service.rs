//! Market application service.
//!
//! Orchestrates the player aggregate against its collaborators: the event
//! store (through [`CommandDispatcher`]), the item catalog, the clock, the
//! player name directory and the price generator. Every state change is one
//! dispatch, so each operation commits all of its events or none of them.

use std::sync::Mutex;

use rust_decimal::Decimal;
use thiserror::Error;

use tradepost_core::{AggregateId, DomainError, ItemId};
use tradepost_market::{
    AddDailyPrice, BuyItem, ClearDailyPrices, CreatePlayer, Item, Player, PlayerCommand,
    PlayerCreated, PlayerEvent, PlayerId, PriceGenerator, SellItem,
};

use crate::catalog::{CatalogError, ItemCatalog};
use crate::clock::Clock;
use crate::command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
use crate::config::MarketConfig;
use crate::directory::{DirectoryError, PlayerDirectory};
use crate::event_store::{EventStore, EventStoreError};
use crate::views::{
    InventoryView, ItemView, PlayerView, PurchaseView, inventory_view, item_view, player_view,
};

/// Stream type for player aggregates.
pub const PLAYER_AGGREGATE_TYPE: &str = "market.player";

#[derive(Debug, Error)]
pub enum MarketError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(DomainError),

    #[error("player {0} not found")]
    PlayerNotFound(String),

    #[error("player name '{0}' is already taken")]
    PlayerNameTaken(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("player directory unavailable: {0}")]
    Directory(String),

    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("corrupt player stream: {0}")]
    CorruptStream(String),

    #[error(transparent)]
    Store(EventStoreError),
}

impl MarketError {
    /// `true` for business rule rejections, as opposed to infrastructure failures.
    pub fn is_domain(&self) -> bool {
        matches!(self, MarketError::Domain(_))
    }

    /// Stable error code of a business rule rejection.
    pub fn domain_code(&self) -> Option<&'static str> {
        match self {
            MarketError::Domain(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl From<DomainError> for MarketError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => MarketError::Concurrency(msg),
            other => MarketError::Domain(other),
        }
    }
}

impl From<DispatchError> for MarketError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Domain(e) => MarketError::from(e),
            DispatchError::Concurrency(msg) => MarketError::Concurrency(msg),
            DispatchError::Deserialize(msg) => MarketError::CorruptStream(msg),
            DispatchError::Store(e) => MarketError::Store(e),
        }
    }
}

impl From<DirectoryError> for MarketError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::NameTaken(name) => MarketError::PlayerNameTaken(name),
            DirectoryError::Unavailable(msg) => MarketError::Directory(msg),
        }
    }
}

pub struct MarketService<S, C, K> {
    dispatcher: CommandDispatcher<S>,
    catalog: C,
    clock: K,
    directory: PlayerDirectory,
    generator: Mutex<PriceGenerator>,
    config: MarketConfig,
}

impl<S, C, K> MarketService<S, C, K>
where
    S: EventStore,
    C: ItemCatalog,
    K: Clock,
{
    pub fn new(store: S, catalog: C, clock: K, config: MarketConfig) -> Self {
        let generator = match config.price_seed {
            Some(seed) => PriceGenerator::seeded(seed),
            None => PriceGenerator::from_entropy(),
        };

        Self {
            dispatcher: CommandDispatcher::new(store),
            catalog,
            clock,
            directory: PlayerDirectory::new(),
            generator: Mutex::new(generator),
            config,
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.dispatcher.store()
    }

    /// Add a tradable item to the catalog.
    pub fn create_item(
        &self,
        name: &str,
        description: &str,
        base_price: Decimal,
        volatility: Decimal,
    ) -> Result<ItemView, MarketError> {
        let item = Item::create(ItemId::new(), name, description, base_price, volatility)?;
        self.catalog.add(item.clone())?;

        tracing::info!(
            item_id = %item.id_typed(),
            name = item.name(),
            base_price = %item.base_price(),
            volatility = %item.volatility(),
            "item created"
        );
        Ok(item_view(&item))
    }

    pub fn items(&self) -> Result<Vec<ItemView>, MarketError> {
        Ok(self.catalog.list()?.iter().map(item_view).collect())
    }

    /// Register a player under a unique name.
    ///
    /// `balance` falls back to the configured starting balance.
    pub fn create_player(
        &self,
        name: &str,
        balance: Option<Decimal>,
    ) -> Result<PlayerView, MarketError> {
        self.sync_directory()?;
        let player_id = PlayerId::new(AggregateId::new());
        self.directory.reserve(name, player_id)?;

        let command = PlayerCommand::CreatePlayer(CreatePlayer {
            player_id,
            name: name.to_string(),
            balance: balance.unwrap_or(self.config.starting_balance),
            policy: self.config.balance_policy,
            occurred_at: self.clock.now(),
        });

        let dispatched = match self.dispatch(player_id, vec![command]) {
            Ok(d) => d,
            Err(err) => {
                self.directory.release(name, player_id);
                tracing::debug!(name, error = %err, "player creation rejected");
                return Err(err);
            }
        };

        let player = dispatched.aggregate;
        tracing::info!(
            player_id = %player.id_typed(),
            name = player.name(),
            balance = %player.balance(),
            "player created"
        );
        self.view(&player)
    }

    pub fn player(&self, player_id: PlayerId) -> Result<PlayerView, MarketError> {
        let player = self.load_player(player_id)?;
        self.view(&player)
    }

    pub fn player_by_name(&self, name: &str) -> Result<PlayerView, MarketError> {
        self.sync_directory()?;
        let player_id = self
            .directory
            .lookup(name)?
            .ok_or_else(|| MarketError::PlayerNotFound(name.trim().to_string()))?;
        self.player(player_id)
    }

    /// Open today's market for a player.
    ///
    /// The first visit of a trading day drops the previous day's snapshots
    /// and prices every catalog item; later visits the same day reuse them.
    pub fn enter_market(&self, player_id: PlayerId) -> Result<PlayerView, MarketError> {
        let player = self.load_player(player_id)?;
        let today = self.clock.today();

        if player.has_prices_for(today) {
            tracing::debug!(%player_id, %today, "prices already generated");
            return self.view(&player);
        }

        let items = self.catalog.list()?;
        let now = self.clock.now();

        let mut commands = vec![PlayerCommand::ClearDailyPrices(ClearDailyPrices {
            player_id,
            occurred_at: now,
        })];
        {
            let mut generator = match self.generator.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            for item in &items {
                let generated = generator.generate(item);
                commands.push(PlayerCommand::AddDailyPrice(AddDailyPrice::new(
                    player_id, item, today, generated, now,
                )));
            }
        }

        let dispatched = self.dispatch(player_id, commands)?;
        tracing::info!(%player_id, %today, count = items.len(), "daily prices generated");

        Ok(player_view(&dispatched.aggregate, &items, today))
    }

    /// Buy `quantity` units of an item at today's price.
    pub fn buy(
        &self,
        player_id: PlayerId,
        item_id: ItemId,
        quantity: i64,
    ) -> Result<PurchaseView, MarketError> {
        let command = PlayerCommand::BuyItem(BuyItem::new(
            player_id,
            item_id,
            quantity,
            self.clock.now(),
        ));
        let dispatched = self
            .dispatch_trade(player_id, command)
            .inspect_err(|err| log_rejected("buy", player_id, item_id, quantity, err))?;

        let (outcome, total) = dispatched
            .events
            .iter()
            .find_map(|e| match e {
                PlayerEvent::ItemBought(bought) => dispatched
                    .aggregate
                    .bought_line(bought)
                    .map(|o| (o, bought.total_cost)),
                _ => None,
            })
            .ok_or(MarketError::Domain(DomainError::InventoryNotFound))?;

        tracing::info!(
            %player_id,
            %item_id,
            quantity,
            total = %total,
            balance = %dispatched.aggregate.balance(),
            "item bought"
        );

        let item = self.catalog.get(item_id)?;
        Ok(PurchaseView {
            line: inventory_view(&outcome.line, item.as_ref()),
            was_new_line: outcome.was_new_line,
        })
    }

    /// Sell `quantity` units of a held item at today's price.
    ///
    /// A line sold down to zero is returned with quantity 0.
    pub fn sell(
        &self,
        player_id: PlayerId,
        item_id: ItemId,
        quantity: i64,
    ) -> Result<InventoryView, MarketError> {
        let command = PlayerCommand::SellItem(SellItem::new(
            player_id,
            item_id,
            quantity,
            self.clock.now(),
        ));
        let dispatched = self
            .dispatch_trade(player_id, command)
            .inspect_err(|err| log_rejected("sell", player_id, item_id, quantity, err))?;

        let (line, revenue) = dispatched
            .events
            .iter()
            .find_map(|e| match e {
                PlayerEvent::ItemSold(sold) => {
                    Some((dispatched.aggregate.sold_line(sold), sold.revenue))
                }
                _ => None,
            })
            .ok_or(MarketError::Domain(DomainError::InventoryNotFound))?;

        tracing::info!(
            %player_id,
            %item_id,
            quantity,
            total = %revenue,
            balance = %dispatched.aggregate.balance(),
            "item sold"
        );

        let item = self.catalog.get(item_id)?;
        Ok(inventory_view(&line, item.as_ref()))
    }

    fn dispatch_trade(
        &self,
        player_id: PlayerId,
        command: PlayerCommand,
    ) -> Result<Dispatched<Player>, MarketError> {
        // A stream that was never created is an unknown player, not a rejected trade.
        self.dispatch(player_id, vec![command]).map_err(|err| match err {
            MarketError::Domain(DomainError::NotCreated) => {
                MarketError::PlayerNotFound(player_id.to_string())
            }
            other => other,
        })
    }

    fn dispatch(
        &self,
        player_id: PlayerId,
        commands: Vec<PlayerCommand>,
    ) -> Result<Dispatched<Player>, MarketError> {
        Ok(self.dispatcher.dispatch_all(
            player_id.0,
            PLAYER_AGGREGATE_TYPE,
            commands,
            |id| Player::empty(PlayerId::new(id)),
        )?)
    }

    /// Index players created by any service sharing this store.
    fn sync_directory(&self) -> Result<(), MarketError> {
        let created = self
            .store()
            .load_by_event_type(PlayerCreated::EVENT_TYPE)
            .map_err(MarketError::Store)?;

        for stored in &created {
            match stored.decode::<PlayerEvent>() {
                Ok(PlayerEvent::PlayerCreated(e)) => self.directory.record(&e.name, e.player_id)?,
                Ok(_) => {}
                Err(e) => {
                    return Err(MarketError::CorruptStream(format!(
                        "{} #{}: {e}",
                        stored.event_type, stored.sequence_number
                    )));
                }
            }
        }
        Ok(())
    }

    fn load_player(&self, player_id: PlayerId) -> Result<Player, MarketError> {
        let player = self
            .dispatcher
            .load(player_id.0, |id| Player::empty(PlayerId::new(id)))?;

        if !player.is_created() {
            return Err(MarketError::PlayerNotFound(player_id.to_string()));
        }
        Ok(player)
    }

    fn view(&self, player: &Player) -> Result<PlayerView, MarketError> {
        let items = self.catalog.list()?;
        Ok(player_view(player, &items, self.clock.today()))
    }
}

fn log_rejected(side: &str, player_id: PlayerId, item_id: ItemId, quantity: i64, err: &MarketError) {
    match err.domain_code() {
        Some(code) => tracing::debug!(side, %player_id, %item_id, quantity, code, "trade rejected"),
        None => tracing::warn!(side, %player_id, %item_id, quantity, error = %err, "trade failed"),
    }
}
