use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::move_manager::MoveData;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Fire,
    Water,
    Grass,
    Electric,
    Normal,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::Fire,
        ElementType::Water,
        ElementType::Grass,
        ElementType::Electric,
        ElementType::Normal,
    ];
}

/// Static template defining a creature's base properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub element: ElementType,
    pub level: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<MoveData>,
    pub image_url: String,
}

/// A creature instance. Every instance is an owned copy: damaging one never
/// touches its template or any other instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Monster {
    pub instance_id: String,
    pub template_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub element: ElementType,
    pub level: u32,
    pub max_hp: u32,
    pub current_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<MoveData>,
    pub image_url: String,
    pub experience: u64,
}

/// Lightweight view used by the party screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayMonster {
    pub instance_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub element: ElementType,
    pub level: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub hp_ratio: f32,
    pub image_url: String,
}

impl Monster {
    /// Creates a fresh, full-health instance of a template
    pub fn from_template(template: &MonsterTemplate) -> Self {
        Monster {
            instance_id: Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            name: template.name.clone(),
            element: template.element,
            level: template.level,
            max_hp: template.max_hp,
            current_hp: template.max_hp,
            attack: template.attack,
            defense: template.defense,
            speed: template.speed,
            moves: template.moves.clone(),
            image_url: template.image_url.clone(),
            experience: 0,
        }
    }

    /// Reduces current HP, clamping at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_sub(amount);
        before - self.current_hp
    }

    pub fn heal_full(&mut self) {
        self.current_hp = self.max_hp;
    }

    /// Copy of this creature restored to full health, with a new instance id
    pub fn healed_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.instance_id = Uuid::new_v4().to_string();
        copy.heal_full();
        copy
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Remaining health as a fraction of maximum, in [0, 1]
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.max_hp as f64
    }

    pub fn to_display(&self) -> DisplayMonster {
        DisplayMonster {
            instance_id: self.instance_id.clone(),
            name: self.name.clone(),
            element: self.element,
            level: self.level,
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            hp_ratio: self.hp_ratio() as f32,
            image_url: self.image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monsters::MonsterCatalog;

    #[test]
    fn instances_are_independent_copies() {
        let catalog = MonsterCatalog::builtin();
        let template = catalog.starter("1").unwrap();

        let mut first = Monster::from_template(template);
        let second = Monster::from_template(template);
        first.take_damage(10);

        assert_eq!(first.current_hp, template.max_hp - 10);
        assert_eq!(second.current_hp, template.max_hp);
        assert_ne!(first.instance_id, second.instance_id);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let catalog = MonsterCatalog::builtin();
        let mut monster = Monster::from_template(catalog.starter("2").unwrap());

        let lost = monster.take_damage(1_000);

        assert_eq!(lost, 44);
        assert_eq!(monster.current_hp, 0);
        assert!(monster.is_fainted());
        assert_eq!(monster.hp_ratio(), 0.0);
    }

    #[test]
    fn healed_copy_restores_health_and_keeps_original() {
        let catalog = MonsterCatalog::builtin();
        let mut monster = Monster::from_template(&catalog.wild_templates()[0]);
        monster.take_damage(20);

        let copy = monster.healed_copy();

        assert_eq!(copy.current_hp, copy.max_hp);
        assert_eq!(monster.current_hp, monster.max_hp - 20);
        assert_ne!(copy.instance_id, monster.instance_id);
    }

    #[test]
    fn element_types_serialize_in_upper_case() {
        let json = serde_json::to_string(&ElementType::Electric).unwrap();
        assert_eq!(json, "\"ELECTRIC\"");
    }
}
