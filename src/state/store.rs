use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::state::{
    player::{Player, PlayerId},
    session::{GameId, Session, SessionId},
};

/// A session together with its roster; guarded as one unit so submissions and
/// transitions never interleave.
#[derive(Debug)]
pub struct SessionRecord {
    /// The session itself.
    pub session: Session,
    /// Players in join order.
    pub players: IndexMap<PlayerId, Player>,
}

/// Shared handle to a session record.
pub type SessionHandle = Arc<RwLock<SessionRecord>>;

/// In-memory registry of sessions keyed by join code.
///
/// Also tracks the single running session of each game and hands out the
/// per-game gate serialising start/advance/end.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
    reserved: DashMap<SessionId, ()>,
    active: DashMap<GameId, SessionId>,
    gates: DashMap<GameId, Arc<Mutex<()>>>,
}

impl SessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the transition gate of `game_id`.
    pub async fn lock_game(&self, game_id: GameId) -> OwnedMutexGuard<()> {
        let gate = self.gates.entry(game_id).or_default().clone();
        gate.lock_owned().await
    }

    /// Reserve a fresh session id that no live or reserved session uses.
    pub fn reserve_id(&self) -> SessionId {
        loop {
            let candidate = SessionId::random();
            if self.sessions.contains_key(&candidate) {
                continue;
            }
            if let Entry::Vacant(slot) = self.reserved.entry(candidate) {
                slot.insert(());
                return candidate;
            }
        }
    }

    /// Give back a reservation that will not be used.
    pub fn release_id(&self, id: SessionId) {
        self.reserved.remove(&id);
    }

    /// Register a session built on a reserved id and mark it active for its game.
    pub fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id;
        let game_id = session.game_id;
        let handle = Arc::new(RwLock::new(SessionRecord {
            session,
            players: IndexMap::new(),
        }));
        self.sessions.insert(id, handle.clone());
        self.reserved.remove(&id);
        self.active.insert(game_id, id);
        handle
    }

    /// Look up a session by id.
    pub fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Session currently running for `game_id`.
    pub fn active_for(&self, game_id: GameId) -> Option<SessionId> {
        self.active.get(&game_id).map(|entry| *entry.value())
    }

    /// Forget the active pointer of `game_id` if it still names `session_id`.
    pub fn mark_ended(&self, game_id: GameId, session_id: SessionId) {
        self.active
            .remove_if(&game_id, |_, current| *current == session_id);
    }

    /// Remove a session from the registry.
    ///
    /// The game gate goes too unless the game is running again or someone
    /// holds or waits on it.
    pub fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        let (_, handle) = self.sessions.remove(&id)?;
        if let Ok(record) = handle.try_read() {
            let game_id = record.session.game_id;
            if !self.active.contains_key(&game_id) {
                self.gates
                    .remove_if(&game_id, |_, gate| Arc::strong_count(gate) == 1);
            }
        }
        Some(handle)
    }

    /// Number of sessions held, ended ones included.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, question};
    use uuid::Uuid;

    fn session(id: SessionId, game_id: GameId) -> Session {
        Session::new(
            id,
            game_id,
            "owner@example.com".into(),
            vec![question(10, 10, &[("a", true)])],
            at(0),
        )
    }

    #[test]
    fn reserved_ids_are_unique_and_released_on_insert() {
        let store = SessionStore::new();
        let first = store.reserve_id();
        let second = store.reserve_id();
        assert_ne!(first, second);

        let game_id = Uuid::new_v4();
        store.insert(session(first, game_id));

        assert!(store.get(first).is_some());
        assert!(!store.reserved.contains_key(&first));
        assert_eq!(store.active_for(game_id), Some(first));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn mark_ended_only_clears_matching_session() {
        let store = SessionStore::new();
        let game_id = Uuid::new_v4();
        let id = store.reserve_id();
        store.insert(session(id, game_id));

        store.mark_ended(game_id, SessionId::from(1));
        assert_eq!(store.active_for(game_id), Some(id));

        store.mark_ended(game_id, id);
        assert_eq!(store.active_for(game_id), None);
        assert!(store.get(id).is_some());
    }

    #[tokio::test]
    async fn remove_drops_idle_gate_only() {
        let store = SessionStore::new();
        let game_id = Uuid::new_v4();
        let id = store.reserve_id();
        store.insert(session(id, game_id));
        drop(store.lock_game(game_id).await);
        store.mark_ended(game_id, id);

        let held = store.lock_game(game_id).await;
        assert!(store.remove(id).is_some());
        assert!(store.get(id).is_none());
        assert!(store.gates.contains_key(&game_id));
        drop(held);

        let again = store.reserve_id();
        store.insert(session(again, game_id));
        store.mark_ended(game_id, again);
        assert!(store.remove(again).is_some());
        assert!(!store.gates.contains_key(&game_id));
        assert!(store.remove(again).is_none());
    }

    #[tokio::test]
    async fn game_gate_is_exclusive_per_game() {
        let store = SessionStore::new();
        let game_id = Uuid::new_v4();

        let guard = store.lock_game(game_id).await;
        let gate = store.gates.get(&game_id).unwrap().clone();
        assert!(gate.try_lock().is_err());

        let other = store.lock_game(Uuid::new_v4()).await;
        drop(other);
        drop(guard);
        assert!(gate.try_lock().is_ok());
    }
}
