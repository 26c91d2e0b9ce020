use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::combat::{BattleController, BattlePacing, BattleResult, BattleSession, Commentator};
use crate::config::BattleConfig;
use crate::error::{GameError, GameResult};
use crate::monsters::{DisplayMonster, Monster, MonsterCatalog};

/// Which screen the player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Menu,
    Overworld,
    Battle,
}

/// One player's game: the roster, the current screen and the battle in
/// progress, if any. Index 0 of the roster is the lead battler.
pub struct GameSession {
    id: Uuid,
    catalog: Arc<MonsterCatalog>,
    commentator: Commentator,
    battle_config: BattleConfig,
    rng: SmallRng,
    screen: Screen,
    roster: Vec<Monster>,
    battle: Option<BattleController>,
}

impl GameSession {
    pub fn new(catalog: Arc<MonsterCatalog>, commentator: Commentator, battle_config: BattleConfig) -> Self {
        Self::with_rng(catalog, commentator, battle_config, SmallRng::from_entropy())
    }

    pub fn with_rng(
        catalog: Arc<MonsterCatalog>,
        commentator: Commentator,
        battle_config: BattleConfig,
        rng: SmallRng,
    ) -> Self {
        GameSession {
            id: Uuid::new_v4(),
            catalog,
            commentator,
            battle_config,
            rng,
            screen: Screen::Menu,
            roster: Vec::new(),
            battle: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn roster(&self) -> &[Monster] {
        &self.roster
    }

    pub fn catalog(&self) -> &MonsterCatalog {
        &self.catalog
    }

    /// Party screen view of every roster member
    pub fn party_overview(&self) -> Vec<DisplayMonster> {
        self.roster.iter().map(Monster::to_display).collect()
    }

    pub fn active_battle(&self) -> Option<&BattleController> {
        self.battle.as_ref()
    }

    /// Replace the roster with a fresh copy of the chosen starter
    pub fn start_new_game(&mut self, starter_id: &str) -> GameResult<&[Monster]> {
        self.require_screen("start_new_game", Screen::Menu)?;
        let template = self
            .catalog
            .starter(starter_id)
            .ok_or_else(|| GameError::UnknownStarter(starter_id.to_string()))?;

        let starter = Monster::from_template(template);
        info!("Session {} started a new game with {}", self.id, starter.name);
        self.roster = vec![starter];
        self.screen = Screen::Overworld;
        Ok(&self.roster)
    }

    /// Pick a random wild creature and start a battle against the lead
    pub fn encounter_wild_monster(&mut self) -> GameResult<BattleController> {
        self.require_screen("encounter_wild_monster", Screen::Overworld)?;
        let player = self.roster.first().cloned().ok_or(GameError::EmptyRoster)?;
        let template = self
            .catalog
            .random_wild(&mut self.rng)
            .ok_or(GameError::NoWildMonsters)?;

        let mut enemy = Monster::from_template(template);
        enemy.heal_full();
        info!("Session {} encountered a wild {}", self.id, enemy.name);

        let battle = BattleSession::new(player, enemy, self.battle_config.log_capacity);
        let controller = BattleController::start_with_rng(
            battle,
            self.commentator.clone(),
            BattlePacing::from(&self.battle_config),
            self.battle_config.snapshot_channel_size,
            SmallRng::seed_from_u64(self.rng.gen()),
        );

        self.battle = Some(controller.clone());
        self.screen = Screen::Battle;
        Ok(controller)
    }

    /// Merge a finished battle into the roster and return to exploration
    pub async fn finish_battle(&mut self) -> GameResult<BattleResult> {
        self.require_screen("finish_battle", Screen::Battle)?;
        let controller = self.battle.as_ref().ok_or(GameError::BattleNotFinished)?;
        let result = controller.result().await.ok_or(GameError::BattleNotFinished)?;

        match self.roster.first_mut() {
            Some(lead) => *lead = result.player_monster.clone(),
            None => return Err(GameError::EmptyRoster),
        }
        if let Some(captured) = &result.captured {
            self.roster.push(captured.clone());
        }

        info!(
            "Session {} finished battle with {:?}, roster size {}",
            self.id,
            result.outcome,
            self.roster.len()
        );

        self.close_battle().await;
        self.screen = Screen::Overworld;
        Ok(result)
    }

    /// Abandon any battle and go back to the title menu
    pub async fn exit_to_menu(&mut self) {
        self.close_battle().await;
        self.screen = Screen::Menu;
    }

    /// Tear down the battle controller, if any
    pub async fn close_battle(&mut self) {
        if let Some(controller) = self.battle.take() {
            controller.shutdown().await;
        }
    }

    fn require_screen(&self, operation: &'static str, expected: Screen) -> GameResult<()> {
        if self.screen == expected {
            Ok(())
        } else {
            Err(GameError::WrongScreen {
                operation,
                screen: self.screen,
            })
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if let Some(controller) = self.battle.take() {
            controller.close();
        }
    }
}
