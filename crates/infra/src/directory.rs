//! Player name directory.
//!
//! Names are unique across players. The directory is the lookup index for
//! `player_by_name` and reserves a name atomically before the player stream
//! is created. It is rebuilt from `PlayerCreated` events, so the store stays
//! the source of truth.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use tradepost_market::PlayerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("player name '{0}' is already taken")]
    NameTaken(String),

    #[error("player directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
pub struct PlayerDirectory {
    by_name: RwLock<HashMap<String, PlayerId>>,
}

fn key(name: &str) -> String {
    name.trim().to_string()
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `player_id`; fails if another player holds it.
    pub fn reserve(&self, name: &str, player_id: PlayerId) -> Result<(), DirectoryError> {
        let mut by_name = self
            .by_name
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        let key = key(name);
        if by_name.contains_key(&key) {
            return Err(DirectoryError::NameTaken(key));
        }
        by_name.insert(key, player_id);
        Ok(())
    }

    /// Index a player that already exists in the store. A name held by
    /// another id is left untouched.
    pub fn record(&self, name: &str, player_id: PlayerId) -> Result<(), DirectoryError> {
        let mut by_name = self
            .by_name
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        by_name.entry(key(name)).or_insert(player_id);
        Ok(())
    }

    /// Undo a reservation made for `player_id` (creation was rejected).
    pub fn release(&self, name: &str, player_id: PlayerId) {
        if let Ok(mut by_name) = self.by_name.write() {
            let key = key(name);
            if by_name.get(&key) == Some(&player_id) {
                by_name.remove(&key);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Option<PlayerId>, DirectoryError> {
        let by_name = self
            .by_name
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        Ok(by_name.get(&key(name)).copied())
    }

    pub fn len(&self) -> usize {
        self.by_name.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
