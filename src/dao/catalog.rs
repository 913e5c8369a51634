use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::GameEntity;

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error raised by catalog backends regardless of where games are kept.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("catalog seed `{path}` is invalid")]
    Seed {
        path: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl CatalogError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        CatalogError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Game definitions owned outside the session engine.
///
/// The engine only reads games and writes them back whole through
/// [`replace_game`](GameCatalog::replace_game); it never patches fields in place.
pub trait GameCatalog: Send + Sync {
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<Option<GameEntity>>>;
    fn list_games(&self, owner: &str) -> BoxFuture<'static, CatalogResult<Vec<GameEntity>>>;
    fn replace_game(&self, game: GameEntity) -> BoxFuture<'static, CatalogResult<()>>;
    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>>;
}
