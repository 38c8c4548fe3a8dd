//! Catalog of tradable items.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use tradepost_core::ItemId;
use tradepost_market::Item;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("item {0} is already in the catalog")]
    Duplicate(ItemId),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Source of the items priced every trading day.
///
/// `list` returns items in insertion order so a seeded generator produces a
/// reproducible market.
pub trait ItemCatalog: Send + Sync {
    fn add(&self, item: Item) -> Result<(), CatalogError>;
    fn get(&self, id: ItemId) -> Result<Option<Item>, CatalogError>;
    fn list(&self) -> Result<Vec<Item>, CatalogError>;
}

impl<C> ItemCatalog for Arc<C>
where
    C: ItemCatalog + ?Sized,
{
    fn add(&self, item: Item) -> Result<(), CatalogError> {
        (**self).add(item)
    }

    fn get(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<Item>, CatalogError> {
        (**self).list()
    }
}

/// In-memory catalog for tests and the simulator.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<Vec<Item>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Result<Self, CatalogError> {
        let catalog = Self::new();
        for item in items {
            catalog.add(item)?;
        }
        Ok(catalog)
    }
}

impl ItemCatalog for InMemoryCatalog {
    fn add(&self, item: Item) -> Result<(), CatalogError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| CatalogError::Unavailable("lock poisoned".to_string()))?;

        if items.iter().any(|i| i.id_typed() == item.id_typed()) {
            return Err(CatalogError::Duplicate(item.id_typed()));
        }
        items.push(item);
        Ok(())
    }

    fn get(&self, id: ItemId) -> Result<Option<Item>, CatalogError> {
        let items = self
            .items
            .read()
            .map_err(|_| CatalogError::Unavailable("lock poisoned".to_string()))?;

        Ok(items.iter().find(|i| i.id_typed() == id).cloned())
    }

    fn list(&self) -> Result<Vec<Item>, CatalogError> {
        let items = self
            .items
            .read()
            .map_err(|_| CatalogError::Unavailable("lock poisoned".to_string()))?;

        Ok(items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str) -> Item {
        Item::create(ItemId::new(), name, "for testing", dec!(10), dec!(0.1)).unwrap()
    }

    #[test]
    fn list_preserves_insertion_order() {
        let catalog = InMemoryCatalog::with_items([item("Sword"), item("Axe"), item("Dagger")]).unwrap();
        let names: Vec<_> = catalog.list().unwrap().iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["Sword", "Axe", "Dagger"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let catalog = InMemoryCatalog::new();
        let sword = item("Sword");
        catalog.add(sword.clone()).unwrap();
        assert_eq!(catalog.add(sword.clone()), Err(CatalogError::Duplicate(sword.id_typed())));
        assert_eq!(catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn get_finds_by_id() {
        let catalog = InMemoryCatalog::new();
        let sword = item("Sword");
        catalog.add(sword.clone()).unwrap();
        assert_eq!(catalog.get(sword.id_typed()).unwrap(), Some(sword));
        assert_eq!(catalog.get(ItemId::new()).unwrap(), None);
    }
}
