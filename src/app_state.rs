use crate::combat::Commentator;
use crate::config::Config;
use crate::monsters::MonsterCatalog;
use crate::session::GameSession;
use crate::sessions::SessionRegistry;
use std::sync::Arc;

// Shared application state
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<MonsterCatalog>,
    pub commentator: Commentator,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, catalog: MonsterCatalog, commentator: Commentator) -> Arc<Self> {
        Arc::new(AppState {
            config,
            catalog: Arc::new(catalog),
            commentator,
            sessions: SessionRegistry::new(),
        })
    }

    /// A fresh session on the menu screen, wired to the shared catalog and commentary
    pub fn new_game_session(&self) -> GameSession {
        GameSession::new(self.catalog.clone(), self.commentator.clone(), self.config.battle.clone())
    }
}
