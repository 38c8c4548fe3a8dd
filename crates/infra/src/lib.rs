//! Infrastructure layer: event store, command dispatch, collaborators and the
//! market application service.

pub mod catalog;
pub mod clock;
pub mod command_dispatcher;
pub mod config;
pub mod directory;
pub mod event_store;
pub mod market_service;
pub mod views;

pub use catalog::{CatalogError, InMemoryCatalog, ItemCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
pub use config::{ConfigError, MarketConfig};
pub use directory::{DirectoryError, PlayerDirectory};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use market_service::{MarketError, MarketService, PLAYER_AGGREGATE_TYPE};
pub use views::{DailyPriceView, InventoryView, ItemView, PlayerView, PurchaseView};
