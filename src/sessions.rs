use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::session::GameSession;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Live game sessions, one per connection
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SharedSession>,
    last_active: DashMap<Uuid, Instant>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: GameSession) -> (Uuid, SharedSession) {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone());
        self.last_active.insert(id, Instant::now());
        tracing::info!("Session {} registered ({} live)", id, self.sessions.len());
        (id, shared)
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Record activity so the session survives the next sweep
    pub fn touch(&self, id: &Uuid) {
        if self.sessions.contains_key(id) {
            self.last_active.insert(*id, Instant::now());
        }
    }

    /// Remove a session and tear down its battle
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.last_active.remove(id);
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.lock().await.close_battle().await;
                tracing::info!("Session {} removed ({} live)", id, self.sessions.len());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Drop sessions idle for longer than `timeout`. Returns how many were removed.
pub async fn cleanup_inactive_sessions(registry: &SessionRegistry, timeout: Duration) -> usize {
    let now = Instant::now();

    let inactive: Vec<Uuid> = registry
        .last_active
        .iter()
        .filter_map(|entry| {
            if now.duration_since(*entry.value()) > timeout {
                Some(*entry.key())
            } else {
                None
            }
        })
        .collect();

    let mut removed = 0;
    for id in inactive {
        tracing::info!("Removing inactive session {}", id);
        if registry.remove(&id).await {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Commentator;
    use crate::config::BattleConfig;
    use crate::monsters::MonsterCatalog;

    fn game_session() -> GameSession {
        GameSession::new(
            Arc::new(MonsterCatalog::builtin()),
            Commentator::template(),
            BattleConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_idle_sessions() {
        let registry = SessionRegistry::new();
        let (idle, _) = registry.insert(game_session());
        let (busy, _) = registry.insert(game_session());

        tokio::time::advance(Duration::from_secs(90)).await;
        registry.touch(&busy);
        tokio::time::advance(Duration::from_secs(30)).await;

        let removed = cleanup_inactive_sessions(&registry, Duration::from_secs(100)).await;
        assert_eq!(removed, 1);
        assert!(registry.get(&idle).is_none());
        assert!(registry.get(&busy).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn removing_a_session_tears_down_its_battle() {
        let registry = SessionRegistry::new();
        let (id, shared) = registry.insert(game_session());

        let controller = {
            let mut session = shared.lock().await;
            session.start_new_game("1").unwrap();
            session.encounter_wild_monster().unwrap()
        };

        assert!(registry.remove(&id).await);
        assert!(registry.is_empty());
        assert!(matches!(
            controller.use_move(0).await,
            crate::combat::ActionOutcome::Ignored(crate::combat::Rejection::TornDown)
        ));
        assert!(!registry.remove(&id).await);
    }
}
