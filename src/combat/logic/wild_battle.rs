//! Transitions of the wild battle state machine.
//!
//! Each action is split in two: `begin_*` validates the trigger, takes the
//! in-flight lock and rolls the random outcome; `resolve_*` applies it. The
//! caller fetches commentary (or waits out a presentation delay) in between,
//! and any trigger issued meanwhile is rejected as a no-op.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::combat::commentary::CommentaryRequest;
use crate::combat::logic::battle_calculations::{calculate_damage, DamageRoll};
use crate::combat::logic::capture::attempt_capture;
use crate::combat::state::{BattlePhase, BattleSession, Side};
use crate::monsters::MoveData;

/// Why a trigger was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    NotYourTurn,
    ActionInFlight,
    BattleOver,
    TornDown,
    UnknownMove,
}

/// An attack whose damage is rolled but not yet applied
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttack {
    pub attacker: Side,
    pub move_data: MoveData,
    pub roll: DamageRoll,
    attacker_name: String,
    defender_name: String,
}

impl PendingAttack {
    pub fn commentary_request(&self) -> CommentaryRequest {
        CommentaryRequest {
            attacker: self.attacker_name.clone(),
            defender: self.defender_name.clone(),
            move_name: self.move_data.name.clone(),
            critical: false,
            effectiveness: self.roll.effectiveness,
        }
    }
}

/// A thrown ball whose outcome is rolled but not yet revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCapture {
    pub success: bool,
}

/// What applying an attack did to the battle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackResolution {
    /// Turn passed to the other side
    Continue { next: Side },
    /// The enemy fainted; the victory line is still owed to the log
    Victory { winner: String, loser: String },
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureResolution {
    Caught,
    BrokeFree,
}

fn check_trigger(battle: &BattleSession, side: Side) -> Result<(), Rejection> {
    if battle.torn_down {
        return Err(Rejection::TornDown);
    }
    if battle.phase.is_terminal() {
        return Err(Rejection::BattleOver);
    }
    if battle.action_in_flight {
        return Err(Rejection::ActionInFlight);
    }
    if battle.turn != side {
        return Err(Rejection::NotYourTurn);
    }
    Ok(())
}

fn begin_attack<R: Rng>(battle: &mut BattleSession, attacker: Side, move_data: MoveData, rng: &mut R) -> PendingAttack {
    let defender = attacker.opponent();
    let roll = calculate_damage(battle.monster(attacker), battle.monster(defender), &move_data, rng);
    battle.action_in_flight = true;

    PendingAttack {
        attacker,
        attacker_name: battle.monster(attacker).name.clone(),
        defender_name: battle.monster(defender).name.clone(),
        move_data,
        roll,
    }
}

/// Player selects one of their known moves
pub fn begin_player_move<R: Rng>(
    battle: &mut BattleSession,
    move_index: usize,
    rng: &mut R,
) -> Result<PendingAttack, Rejection> {
    check_trigger(battle, Side::Player)?;
    let move_data = battle
        .player_monster
        .moves
        .get(move_index)
        .cloned()
        .ok_or(Rejection::UnknownMove)?;

    Ok(begin_attack(battle, Side::Player, move_data, rng))
}

/// Enemy picks uniformly among its known moves
pub fn begin_enemy_move<R: Rng>(battle: &mut BattleSession, rng: &mut R) -> Result<PendingAttack, Rejection> {
    check_trigger(battle, Side::Enemy)?;
    let move_data = battle
        .enemy_monster
        .moves
        .choose(rng)
        .cloned()
        .ok_or(Rejection::UnknownMove)?;

    Ok(begin_attack(battle, Side::Enemy, move_data, rng))
}

/// Apply a rolled attack along with its narration line
pub fn resolve_attack(
    battle: &mut BattleSession,
    pending: PendingAttack,
    line: String,
) -> Result<AttackResolution, Rejection> {
    if battle.torn_down {
        return Err(Rejection::TornDown);
    }

    let attacker = pending.attacker;
    let defender = attacker.opponent();
    battle.monster_mut(defender).take_damage(pending.roll.damage);
    battle.push_log(line);
    battle.turn_number += 1;

    if !battle.monster(defender).is_fainted() {
        battle.action_in_flight = false;
        battle.turn = defender;
        return Ok(AttackResolution::Continue { next: defender });
    }

    let winner = battle.monster(attacker).name.clone();
    let loser = battle.monster(defender).name.clone();
    match attacker {
        // Stays in flight until `complete_victory` logs the victory line
        Side::Player => Ok(AttackResolution::Victory { winner, loser }),
        Side::Enemy => {
            battle.action_in_flight = false;
            battle.phase = BattlePhase::Defeat;
            battle.push_log(format!("{} defeated {}!", winner, loser));
            tracing::info!("Battle {}: {} was defeated by {}", battle.battle_id, loser, winner);
            Ok(AttackResolution::Defeat)
        }
    }
}

/// Log the victory line and end the battle after the player's knockout
pub fn complete_victory(battle: &mut BattleSession, line: String) -> Result<(), Rejection> {
    if battle.torn_down {
        return Err(Rejection::TornDown);
    }
    if battle.phase.is_terminal() || !battle.action_in_flight || !battle.enemy_monster.is_fainted() {
        return Err(Rejection::BattleOver);
    }

    battle.push_log(line);
    battle.action_in_flight = false;
    battle.phase = BattlePhase::Victory;
    tracing::info!(
        "Battle {}: {} defeated {}",
        battle.battle_id,
        battle.player_monster.name,
        battle.enemy_monster.name
    );
    Ok(())
}

/// Player throws a ball. The outcome is rolled now and revealed later.
pub fn begin_capture<R: Rng>(battle: &mut BattleSession, rng: &mut R) -> Result<PendingCapture, Rejection> {
    check_trigger(battle, Side::Player)?;
    battle.action_in_flight = true;
    battle.push_log("You threw a Gemiball!");

    let success = attempt_capture(&battle.enemy_monster, rng);
    Ok(PendingCapture { success })
}

/// Reveal a thrown ball's outcome
pub fn resolve_capture(battle: &mut BattleSession, pending: PendingCapture) -> Result<CaptureResolution, Rejection> {
    if battle.torn_down {
        return Err(Rejection::TornDown);
    }

    battle.action_in_flight = false;
    battle.turn_number += 1;

    if pending.success {
        battle.phase = BattlePhase::Captured;
        battle.push_log(format!("Gotcha! {} was caught!", battle.enemy_monster.name));
        tracing::info!("Battle {}: captured {}", battle.battle_id, battle.enemy_monster.name);
        Ok(CaptureResolution::Caught)
    } else {
        battle.turn = Side::Enemy;
        battle.push_log("Oh no! The wild Gemimon broke free!");
        Ok(CaptureResolution::BrokeFree)
    }
}
