use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::monsters::{ElementType, Monster, MoveData};

/// Lower and upper bound of the random damage factor
pub const RANDOM_FACTOR_MIN: f64 = 0.85;
pub const RANDOM_FACTOR_MAX: f64 = 1.0;

/// Coarse effectiveness tier, as reported to the commentary provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effectiveness {
    Normal,
    Super,
    Not,
}

impl Effectiveness {
    pub fn from_multiplier(multiplier: f64) -> Self {
        if multiplier > 1.0 {
            Effectiveness::Super
        } else if multiplier < 1.0 {
            Effectiveness::Not
        } else {
            Effectiveness::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Effectiveness::Normal => "NORMAL",
            Effectiveness::Super => "SUPER",
            Effectiveness::Not => "NOT",
        }
    }
}

/// Result of a single damage roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: u32,
    pub multiplier: f64,
    pub effectiveness: Effectiveness,
}

/// Fixed type chart over FIRE, WATER and GRASS. Everything else is neutral.
pub fn type_effectiveness(attack_type: ElementType, defender_type: ElementType) -> f64 {
    use ElementType::*;
    match (attack_type, defender_type) {
        (Fire, Grass) | (Water, Fire) | (Grass, Water) => 2.0,
        (Fire, Water) | (Water, Grass) | (Grass, Fire) => 0.5,
        _ => 1.0,
    }
}

/// Damage before type and random modifiers:
/// ((2 * Level / 5 + 2) * Power * A / D) / 50 + 2
pub fn base_damage(attacker: &Monster, defender: &Monster, move_data: &MoveData) -> f64 {
    let level = attacker.level as f64;
    let power = move_data.power as f64;
    let attack = attacker.attack as f64;
    // Zero defense is rejected at load time
    let defense = defender.defense.max(1) as f64;

    ((2.0 * level / 5.0 + 2.0) * power * attack / defense) / 50.0 + 2.0
}

/// Damage with an explicit random factor. Deterministic for a fixed factor.
pub fn calculate_damage_with_factor(
    attacker: &Monster,
    defender: &Monster,
    move_data: &MoveData,
    random_factor: f64,
) -> DamageRoll {
    let multiplier = type_effectiveness(move_data.move_type, defender.element);
    let raw = base_damage(attacker, defender, move_data) * multiplier * random_factor;

    DamageRoll {
        damage: raw.floor().max(0.0) as u32,
        multiplier,
        effectiveness: Effectiveness::from_multiplier(multiplier),
    }
}

/// Calculate damage using the simplified formula with a random factor in [0.85, 1.0].
/// Every move connects; there is no accuracy check and no critical hit.
pub fn calculate_damage<R: Rng>(
    attacker: &Monster,
    defender: &Monster,
    move_data: &MoveData,
    rng: &mut R,
) -> DamageRoll {
    let random_factor = rng.gen_range(RANDOM_FACTOR_MIN..=RANDOM_FACTOR_MAX);
    let roll = calculate_damage_with_factor(attacker, defender, move_data, random_factor);

    tracing::debug!(
        "{} -> {} with {}: {} damage (x{}, factor {:.3})",
        attacker.name,
        defender.name,
        move_data.name,
        roll.damage,
        roll.multiplier,
        random_factor
    );

    roll
}
