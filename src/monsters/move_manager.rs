use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::monster::ElementType;

/// Represents a move in the game. Immutable catalog data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MoveData {
    pub name: String,
    pub power: u32,
    /// Stored for display only; every move connects.
    pub accuracy: u8,
    #[serde(rename = "type")]
    pub move_type: ElementType,
    pub description: String,
}

impl MoveData {
    pub fn new(name: &str, power: u32, accuracy: u8, move_type: ElementType, description: &str) -> Self {
        MoveData {
            name: name.to_string(),
            power,
            accuracy,
            move_type,
            description: description.to_string(),
        }
    }
}

/// Repository for move data, keyed by catalog key (e.g. `WATER_GUN`)
#[derive(Debug, Clone, Default)]
pub struct MoveRepository {
    pub moves: HashMap<String, MoveData>,
}

impl MoveRepository {
    pub fn new(moves: HashMap<String, MoveData>) -> Self {
        MoveRepository { moves }
    }

    /// The built-in move table
    pub fn builtin() -> Self {
        let moves = [
            ("TACKLE", MoveData::new("Tackle", 40, 100, ElementType::Normal, "A basic physical attack.")),
            ("EMBER", MoveData::new("Ember", 40, 100, ElementType::Fire, "Small flames hit the target.")),
            ("WATER_GUN", MoveData::new("Water Gun", 40, 100, ElementType::Water, "A blast of water.")),
            ("VINE_WHIP", MoveData::new("Vine Whip", 45, 100, ElementType::Grass, "Strikes with vines.")),
            ("THUNDER_SHOCK", MoveData::new("Thunder Shock", 40, 100, ElementType::Electric, "A jolting shock.")),
        ];

        MoveRepository {
            moves: moves
                .into_iter()
                .map(|(key, data)| (key.to_string(), data))
                .collect(),
        }
    }

    /// Get move data by key
    pub fn get_move(&self, key: &str) -> Option<&MoveData> {
        self.moves.get(key)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_moves_always_hit() {
        let repo = MoveRepository::builtin();
        assert_eq!(repo.len(), 5);
        assert!(repo.moves.values().all(|m| m.accuracy == 100));
        assert_eq!(repo.get_move("VINE_WHIP").map(|m| m.power), Some(45));
        assert!(repo.get_move("HYPER_BEAM").is_none());
    }
}
