use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monsters::Monster;

pub const DEFAULT_LOG_CAPACITY: usize = 5;

/// Main battle state container for a wild encounter
#[derive(Debug, Clone)]
pub struct BattleSession {
    pub battle_id: Uuid,
    pub player_monster: Monster,
    pub enemy_monster: Monster,
    pub turn: Side,
    pub phase: BattlePhase,
    pub log: BattleLog,
    pub turn_number: u32,
    pub started_at: DateTime<Utc>,
    pub(crate) action_in_flight: bool,
    pub(crate) torn_down: bool,
}

/// Which side acts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Current phase of the battle. Every phase but `Active` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    Active,
    Victory,
    Defeat,
    Captured,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        self != BattlePhase::Active
    }
}

/// How a finished battle ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WildBattleOutcome {
    Victory,
    Defeat,
    Captured,
}

impl WildBattleOutcome {
    /// Banner shown when the battle ends. Experience is not applied.
    pub fn message(self) -> &'static str {
        match self {
            WildBattleOutcome::Victory => "You gained 50 EXP!",
            WildBattleOutcome::Captured => "A new friend joins your party.",
            WildBattleOutcome::Defeat => "Hurry back to the center.",
        }
    }
}

/// Most-recent-first log with a fixed capacity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl BattleLog {
    pub fn new(capacity: usize) -> Self {
        BattleLog {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push_front(entry.into());
        self.entries.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only view consumed by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleSnapshot {
    pub battle_id: Uuid,
    pub player_monster: Monster,
    pub enemy_monster: Monster,
    pub turn: Side,
    pub phase: BattlePhase,
    pub is_victory: bool,
    pub is_defeat: bool,
    pub is_captured: bool,
    pub action_in_flight: bool,
    pub logs: Vec<String>,
}

/// What a terminal battle hands back to the session
#[derive(Debug, Clone, PartialEq)]
pub struct BattleResult {
    pub outcome: WildBattleOutcome,
    pub player_monster: Monster,
    pub captured: Option<Monster>,
}

impl BattleSession {
    /// Start a battle between working copies of both creatures.
    /// The faster side acts first; ties go to the player.
    pub fn new(player_monster: Monster, enemy_monster: Monster, log_capacity: usize) -> Self {
        let turn = if player_monster.speed >= enemy_monster.speed {
            Side::Player
        } else {
            Side::Enemy
        };

        let mut log = BattleLog::new(log_capacity);
        log.push(format!("A wild {} appeared!", enemy_monster.name));

        BattleSession {
            battle_id: Uuid::new_v4(),
            player_monster,
            enemy_monster,
            turn,
            phase: BattlePhase::Active,
            log,
            turn_number: 1,
            started_at: Utc::now(),
            action_in_flight: false,
            torn_down: false,
        }
    }

    pub fn monster(&self, side: Side) -> &Monster {
        match side {
            Side::Player => &self.player_monster,
            Side::Enemy => &self.enemy_monster,
        }
    }

    pub fn monster_mut(&mut self, side: Side) -> &mut Monster {
        match side {
            Side::Player => &mut self.player_monster,
            Side::Enemy => &mut self.enemy_monster,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn action_in_flight(&self) -> bool {
        self.action_in_flight
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// True when the enemy should act next
    pub fn enemy_turn_pending(&self) -> bool {
        self.turn == Side::Enemy && !self.action_in_flight && !self.is_finished() && !self.torn_down
    }

    /// Append a log entry unless the session was torn down
    pub fn push_log(&mut self, entry: impl Into<String>) {
        if !self.torn_down {
            self.log.push(entry);
        }
    }

    /// Prevent any later transition from applying
    pub fn tear_down(&mut self) {
        self.torn_down = true;
        self.action_in_flight = false;
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            battle_id: self.battle_id,
            player_monster: self.player_monster.clone(),
            enemy_monster: self.enemy_monster.clone(),
            turn: self.turn,
            phase: self.phase,
            is_victory: self.phase == BattlePhase::Victory,
            is_defeat: self.phase == BattlePhase::Defeat,
            is_captured: self.phase == BattlePhase::Captured,
            action_in_flight: self.action_in_flight,
            logs: self.log.entries(),
        }
    }

    /// The hand-off value once the battle is terminal
    pub fn result(&self) -> Option<BattleResult> {
        let outcome = match self.phase {
            BattlePhase::Active => return None,
            BattlePhase::Victory => WildBattleOutcome::Victory,
            BattlePhase::Defeat => WildBattleOutcome::Defeat,
            BattlePhase::Captured => WildBattleOutcome::Captured,
        };

        Some(BattleResult {
            outcome,
            player_monster: self.player_monster.clone(),
            captured: (outcome == WildBattleOutcome::Captured).then(|| self.enemy_monster.healed_copy()),
        })
    }
}
