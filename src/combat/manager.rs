use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::combat::commentary::Commentator;
use crate::combat::logic::wild_battle::{
    self, AttackResolution, CaptureResolution, PendingAttack, Rejection,
};
use crate::combat::state::{BattleResult, BattleSession, BattleSnapshot, Side};
use crate::config::BattleConfig;

/// Artificial delays used to pace the battle for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattlePacing {
    pub enemy_think_delay: Duration,
    pub capture_reveal_delay: Duration,
}

impl Default for BattlePacing {
    fn default() -> Self {
        BattlePacing {
            enemy_think_delay: Duration::from_millis(1500),
            capture_reveal_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&BattleConfig> for BattlePacing {
    fn from(config: &BattleConfig) -> Self {
        BattlePacing {
            enemy_think_delay: Duration::from_millis(config.enemy_think_delay_ms),
            capture_reveal_delay: Duration::from_millis(config.capture_reveal_delay_ms),
        }
    }
}

/// Result of issuing a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Accepted,
    Ignored(Rejection),
}

struct BattleCell {
    battle: BattleSession,
    rng: SmallRng,
}

struct ControllerInner {
    battle_id: Uuid,
    cell: Mutex<BattleCell>,
    commentator: Commentator,
    pacing: BattlePacing,
    updates: broadcast::Sender<BattleSnapshot>,
    shutdown: watch::Sender<bool>,
}

/// Drives one battle session: serializes actions, fetches commentary,
/// schedules the enemy turn and the capture reveal, and publishes a
/// snapshot after every change.
#[derive(Clone)]
pub struct BattleController {
    inner: Arc<ControllerInner>,
}

impl BattleController {
    /// Start driving a battle. If the enemy is faster its first turn is scheduled right away.
    pub fn start(battle: BattleSession, commentator: Commentator, pacing: BattlePacing, channel_size: usize) -> Self {
        Self::start_with_rng(battle, commentator, pacing, channel_size, SmallRng::from_entropy())
    }

    pub fn start_with_rng(
        battle: BattleSession,
        commentator: Commentator,
        pacing: BattlePacing,
        channel_size: usize,
        rng: SmallRng,
    ) -> Self {
        let (updates, _) = broadcast::channel(channel_size.max(1));
        let (shutdown, _) = watch::channel(false);
        let enemy_first = battle.turn == Side::Enemy;

        info!(
            "Battle {} started: {} vs wild {} ({} moves first)",
            battle.battle_id,
            battle.player_monster.name,
            battle.enemy_monster.name,
            if enemy_first { "enemy" } else { "player" }
        );

        let controller = BattleController {
            inner: Arc::new(ControllerInner {
                battle_id: battle.battle_id,
                cell: Mutex::new(BattleCell { battle, rng }),
                commentator,
                pacing,
                updates,
                shutdown,
            }),
        };

        if enemy_first {
            schedule_enemy_turn(&controller.inner);
        }
        controller
    }

    pub fn battle_id(&self) -> Uuid {
        self.inner.battle_id
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> broadcast::Receiver<BattleSnapshot> {
        self.inner.updates.subscribe()
    }

    pub async fn snapshot(&self) -> BattleSnapshot {
        self.inner.cell.lock().await.battle.snapshot()
    }

    pub async fn result(&self) -> Option<BattleResult> {
        self.inner.cell.lock().await.battle.result()
    }

    pub async fn is_finished(&self) -> bool {
        self.inner.cell.lock().await.battle.is_finished()
    }

    /// Player uses the move at `move_index`
    pub async fn use_move(&self, move_index: usize) -> ActionOutcome {
        let pending = {
            let mut cell = self.inner.cell.lock().await;
            let BattleCell { battle, rng } = &mut *cell;
            match wild_battle::begin_player_move(battle, move_index, rng) {
                Ok(pending) => {
                    self.inner.publish(battle);
                    pending
                }
                Err(rejection) => return self.inner.ignored("use_move", rejection),
            }
        };

        run_attack(&self.inner, pending).await
    }

    /// Player throws a ball; the outcome is revealed after the reveal delay
    pub async fn throw_ball(&self) -> ActionOutcome {
        let pending = {
            let mut cell = self.inner.cell.lock().await;
            let BattleCell { battle, rng } = &mut *cell;
            match wild_battle::begin_capture(battle, rng) {
                Ok(pending) => {
                    self.inner.publish(battle);
                    pending
                }
                Err(rejection) => return self.inner.ignored("throw_ball", rejection),
            }
        };

        let inner = self.inner.clone();
        let delay = self.inner.pacing.capture_reveal_delay;
        spawn_delayed(&self.inner, delay, "capture reveal", async move {
            let resolution = {
                let mut cell = inner.cell.lock().await;
                if inner.is_closed() {
                    cell.battle.tear_down();
                    return;
                }
                match wild_battle::resolve_capture(&mut cell.battle, pending) {
                    Ok(resolution) => {
                        inner.publish(&cell.battle);
                        resolution
                    }
                    Err(rejection) => {
                        inner.ignored("capture reveal", rejection);
                        return;
                    }
                }
            };

            if resolution == CaptureResolution::BrokeFree {
                schedule_enemy_turn(&inner);
            }
        });

        ActionOutcome::Accepted
    }

    /// Run the enemy's turn immediately, if it is due
    pub async fn run_enemy_turn(&self) -> ActionOutcome {
        enemy_turn(&self.inner).await
    }

    /// Cancel pending timers without waiting for the battle lock
    pub fn close(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Tear the battle down: pending timers are cancelled and no later
    /// transition can apply.
    pub async fn shutdown(&self) {
        self.close();
        self.inner.cell.lock().await.battle.tear_down();
        debug!("Battle {} torn down", self.inner.battle_id);
    }
}

impl ControllerInner {
    fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn publish(&self, battle: &BattleSession) {
        // No subscribers is fine
        let _ = self.updates.send(battle.snapshot());
    }

    fn ignored(&self, trigger: &str, rejection: Rejection) -> ActionOutcome {
        warn!("Battle {}: ignored {} ({:?})", self.battle_id, trigger, rejection);
        ActionOutcome::Ignored(rejection)
    }
}

async fn enemy_turn(inner: &Arc<ControllerInner>) -> ActionOutcome {
    let pending = {
        let mut cell = inner.cell.lock().await;
        let BattleCell { battle, rng } = &mut *cell;
        match wild_battle::begin_enemy_move(battle, rng) {
            Ok(pending) => {
                inner.publish(battle);
                pending
            }
            Err(rejection) => return inner.ignored("enemy turn", rejection),
        }
    };

    run_attack(inner, pending).await
}

/// Narrate and apply an attack that already holds the in-flight lock
async fn run_attack(inner: &Arc<ControllerInner>, pending: PendingAttack) -> ActionOutcome {
    let line = inner.commentator.battle_line(&pending.commentary_request()).await;

    let resolution = {
        let mut cell = inner.cell.lock().await;
        if inner.is_closed() {
            cell.battle.tear_down();
            return ActionOutcome::Ignored(Rejection::TornDown);
        }
        match wild_battle::resolve_attack(&mut cell.battle, pending, line) {
            Ok(resolution) => {
                inner.publish(&cell.battle);
                resolution
            }
            Err(rejection) => return inner.ignored("attack", rejection),
        }
    };

    match resolution {
        AttackResolution::Continue { next: Side::Enemy } => schedule_enemy_turn(inner),
        AttackResolution::Continue { next: Side::Player } | AttackResolution::Defeat => {}
        AttackResolution::Victory { winner, loser } => {
            // The knockout keeps the action in flight until the victory line lands
            let line = inner.commentator.victory_line(&winner, &loser).await;
            let mut cell = inner.cell.lock().await;
            if inner.is_closed() {
                cell.battle.tear_down();
                return ActionOutcome::Ignored(Rejection::TornDown);
            }
            if let Err(rejection) = wild_battle::complete_victory(&mut cell.battle, line) {
                return inner.ignored("victory", rejection);
            }
            inner.publish(&cell.battle);
        }
    }

    ActionOutcome::Accepted
}

fn schedule_enemy_turn(inner: &Arc<ControllerInner>) {
    let task_inner = inner.clone();
    spawn_delayed(inner, inner.pacing.enemy_think_delay, "enemy turn", async move {
        enemy_turn(&task_inner).await;
    });
}

/// Run `task` after `delay` unless the controller is closed first
fn spawn_delayed<F>(inner: &Arc<ControllerInner>, delay: Duration, label: &'static str, task: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let shutdown = inner.shutdown.subscribe();
    let battle_id = inner.battle_id;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(delay) => task.await,
            _ = closed(shutdown) => {
                debug!("Battle {}: cancelled pending {}", battle_id, label);
            }
        }
    });
}

async fn closed(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::commentary::{CommentaryError, CommentaryProvider, CommentaryRequest};
    use crate::combat::state::{BattlePhase, DEFAULT_LOG_CAPACITY};
    use crate::monsters::{Monster, MonsterCatalog};
    use async_trait::async_trait;

    const THINK: Duration = Duration::from_millis(1500);
    const REVEAL: Duration = Duration::from_millis(1000);

    /// Answers after a fixed latency so tests can interleave triggers
    struct LaggyCommentary(Duration);

    #[async_trait]
    impl CommentaryProvider for LaggyCommentary {
        async fn battle_line(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
            tokio::time::sleep(self.0).await;
            Ok(format!("{} strikes with {}!", request.attacker, request.move_name))
        }

        async fn victory_line(&self, winner: &str, loser: &str) -> Result<String, CommentaryError> {
            Ok(format!("{} stands over {}!", winner, loser))
        }
    }

    /// Holds the victory line back so the knockout can be observed mid-flight
    struct SlowVictoryCommentary(Duration);

    #[async_trait]
    impl CommentaryProvider for SlowVictoryCommentary {
        async fn battle_line(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
            Ok(format!("{} strikes with {}!", request.attacker, request.move_name))
        }

        async fn victory_line(&self, winner: &str, loser: &str) -> Result<String, CommentaryError> {
            tokio::time::sleep(self.0).await;
            Ok(format!("{} stands over {}!", winner, loser))
        }
    }

    fn pacing() -> BattlePacing {
        BattlePacing {
            enemy_think_delay: THINK,
            capture_reveal_delay: REVEAL,
        }
    }

    fn controller_with(player_id: &str, enemy_index: usize, commentator: Commentator) -> BattleController {
        let catalog = MonsterCatalog::builtin();
        let player = Monster::from_template(catalog.starter(player_id).unwrap());
        let enemy = Monster::from_template(&catalog.wild_templates()[enemy_index]);
        let battle = BattleSession::new(player, enemy, DEFAULT_LOG_CAPACITY);
        BattleController::start_with_rng(battle, commentator, pacing(), 16, SmallRng::seed_from_u64(5))
    }

    /// Pyrolin against Grom: the player opens.
    fn controller() -> BattleController {
        controller_with("1", 1, Commentator::template())
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn player_move_schedules_enemy_turn_after_delay() {
        let controller = controller();

        assert_eq!(controller.use_move(0).await, ActionOutcome::Accepted);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.turn, Side::Enemy);
        assert_eq!(snapshot.logs[0], "Pyrolin used Tackle!");

        tokio::time::sleep(THINK - Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(controller.snapshot().await.turn, Side::Enemy);

        tokio::time::sleep(Duration::from_millis(20)).await;
        settle().await;
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.turn, Side::Player);
        assert_eq!(snapshot.logs[0], "Grom used Tackle!");
        assert!(snapshot.player_monster.current_hp < snapshot.player_monster.max_hp);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_double_trigger_resolves_once() {
        let controller = controller_with("1", 1, Commentator::new(Arc::new(LaggyCommentary(Duration::from_millis(300))), Duration::from_secs(5)));

        let first = controller.clone();
        let handle = tokio::spawn(async move { first.use_move(0).await });
        settle().await;

        assert!(controller.snapshot().await.action_in_flight);
        assert_eq!(controller.use_move(1).await, ActionOutcome::Ignored(Rejection::ActionInFlight));
        assert_eq!(controller.throw_ball().await, ActionOutcome::Ignored(Rejection::ActionInFlight));

        assert_eq!(handle.await.unwrap(), ActionOutcome::Accepted);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.logs[0], "Pyrolin strikes with Tackle!");
        assert_eq!(snapshot.logs.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn faster_enemy_opens_the_battle() {
        let controller = controller_with("1", 0, Commentator::template());
        assert_eq!(controller.snapshot().await.turn, Side::Enemy);
        assert_eq!(controller.use_move(0).await, ActionOutcome::Ignored(Rejection::NotYourTurn));

        tokio::time::sleep(THINK + Duration::from_millis(10)).await;
        settle().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.turn, Side::Player);
        assert!(snapshot.logs[0].starts_with("Sparky used "));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_capture_reveals_after_delay_then_enemy_acts() {
        let controller = controller();
        let mut updates = controller.subscribe();

        assert_eq!(controller.throw_ball().await, ActionOutcome::Accepted);
        assert_eq!(updates.recv().await.unwrap().logs[0], "You threw a Gemiball!");

        tokio::time::sleep(REVEAL + Duration::from_millis(10)).await;
        settle().await;
        let revealed = updates.recv().await.unwrap();
        assert_eq!(revealed.logs[0], "Oh no! The wild Gemimon broke free!");
        assert_eq!(revealed.turn, Side::Enemy);

        tokio::time::sleep(THINK + Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(controller.snapshot().await.turn, Side::Player);
    }

    #[tokio::test(start_paused = true)]
    async fn victory_appends_victory_line_and_stops() {
        let controller = controller_with("1", 1, Commentator::new(Arc::new(LaggyCommentary(Duration::ZERO)), Duration::from_secs(5)));
        controller.inner.cell.lock().await.battle.enemy_monster.current_hp = 1;

        assert_eq!(controller.use_move(0).await, ActionOutcome::Accepted);

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, BattlePhase::Victory);
        assert_eq!(snapshot.logs[0], "Pyrolin stands over Grom!");
        assert_eq!(snapshot.logs[1], "Pyrolin strikes with Tackle!");

        tokio::time::sleep(THINK * 2).await;
        settle().await;
        assert_eq!(controller.snapshot().await.logs.len(), 3);
        assert_eq!(controller.result().await.unwrap().outcome, crate::combat::state::WildBattleOutcome::Victory);
    }

    #[tokio::test(start_paused = true)]
    async fn battle_is_not_won_until_victory_line_arrives() {
        let commentator = Commentator::new(Arc::new(SlowVictoryCommentary(Duration::from_millis(300))), Duration::from_secs(5));
        let controller = controller_with("1", 1, commentator);
        controller.inner.cell.lock().await.battle.enemy_monster.current_hp = 1;

        let first = controller.clone();
        let handle = tokio::spawn(async move { first.use_move(0).await });
        settle().await;

        let pending = controller.snapshot().await;
        assert_eq!(pending.phase, BattlePhase::Active);
        assert!(!pending.is_victory);
        assert!(pending.action_in_flight);
        assert_eq!(pending.enemy_monster.current_hp, 0);
        assert_eq!(pending.logs[0], "Pyrolin strikes with Tackle!");
        assert!(controller.result().await.is_none());
        assert!(!controller.is_finished().await);
        assert_eq!(controller.throw_ball().await, ActionOutcome::Ignored(Rejection::ActionInFlight));

        assert_eq!(handle.await.unwrap(), ActionOutcome::Accepted);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, BattlePhase::Victory);
        assert!(!snapshot.action_in_flight);
        assert_eq!(snapshot.logs[0], "Pyrolin stands over Grom!");
        assert!(controller.result().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_while_victory_line_pends_leaves_battle_unfinished() {
        let commentator = Commentator::new(Arc::new(SlowVictoryCommentary(Duration::from_millis(300))), Duration::from_secs(5));
        let controller = controller_with("1", 1, commentator);
        controller.inner.cell.lock().await.battle.enemy_monster.current_hp = 1;

        let first = controller.clone();
        let handle = tokio::spawn(async move { first.use_move(0).await });
        settle().await;

        controller.shutdown().await;
        assert_eq!(handle.await.unwrap(), ActionOutcome::Ignored(Rejection::TornDown));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, BattlePhase::Active);
        assert!(!snapshot.logs.iter().any(|entry| entry.contains("stands over")));
        assert!(controller.result().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_capture_reveal() {
        let controller = controller();
        // A fainted target makes the thrown ball a certain catch
        controller.inner.cell.lock().await.battle.enemy_monster.current_hp = 0;

        assert_eq!(controller.throw_ball().await, ActionOutcome::Accepted);
        controller.shutdown().await;
        tokio::time::sleep(REVEAL * 3).await;
        settle().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, BattlePhase::Active);
        assert_eq!(snapshot.logs, vec!["You threw a Gemiball!", "A wild Grom appeared!"]);
        assert!(!snapshot
            .logs
            .iter()
            .any(|entry| entry.contains("Gotcha") || entry.contains("broke free")));
        assert!(controller.result().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_scheduled_enemy_turn() {
        let controller = controller();
        controller.use_move(0).await;
        let before = controller.snapshot().await;

        controller.shutdown().await;
        tokio::time::sleep(THINK * 2).await;
        settle().await;

        let after = controller.snapshot().await;
        assert_eq!(after.player_monster.current_hp, before.player_monster.current_hp);
        assert_eq!(after.logs, before.logs);
        assert_eq!(controller.run_enemy_turn().await, ActionOutcome::Ignored(Rejection::TornDown));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_commentary_discards_the_attack() {
        let controller = controller_with("1", 1, Commentator::new(Arc::new(LaggyCommentary(Duration::from_millis(300))), Duration::from_secs(5)));
        let first = controller.clone();
        let handle = tokio::spawn(async move { first.use_move(0).await });
        settle().await;

        controller.close();
        assert_eq!(handle.await.unwrap(), ActionOutcome::Ignored(Rejection::TornDown));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.enemy_monster.current_hp, snapshot.enemy_monster.max_hp);
    }
}
