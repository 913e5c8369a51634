use std::{fs, path::Path, sync::Arc};

use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use uuid::Uuid;

use crate::dao::{
    catalog::{CatalogError, CatalogResult, GameCatalog},
    models::GameEntity,
};

/// Process-local catalog, optionally seeded from a JSON array of games.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    games: Arc<DashMap<Uuid, GameEntity>>,
}

impl MemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with `games`.
    pub fn with_games(games: impl IntoIterator<Item = GameEntity>) -> Self {
        let catalog = Self::new();
        for game in games {
            catalog.games.insert(game.id, game);
        }
        catalog
    }

    /// Read a JSON array of games from `path`.
    pub fn from_seed_file(path: &Path) -> CatalogResult<Self> {
        let seed_error = |source: Box<dyn std::error::Error + Send + Sync>| CatalogError::Seed {
            path: path.display().to_string(),
            source,
        };
        let contents = fs::read_to_string(path).map_err(|err| seed_error(Box::new(err)))?;
        let games: Vec<GameEntity> =
            serde_json::from_str(&contents).map_err(|err| seed_error(Box::new(err)))?;
        Ok(Self::with_games(games))
    }

    /// Number of stored games.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }
}

impl GameCatalog for MemoryCatalog {
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<Option<GameEntity>>> {
        let game = self.games.get(&id).map(|entry| entry.value().clone());
        future::ready(Ok(game)).boxed()
    }

    fn list_games(&self, owner: &str) -> BoxFuture<'static, CatalogResult<Vec<GameEntity>>> {
        let mut games: Vec<GameEntity> = self
            .games
            .iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        future::ready(Ok(games)).boxed()
    }

    fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, CatalogResult<()>> {
        self.games.insert(game.id, game);
        future::ready(Ok(())).boxed()
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<bool>> {
        let removed = self.games.remove(&id).is_some();
        future::ready(Ok(removed)).boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>> {
        future::ready(Ok(())).boxed()
    }
}
