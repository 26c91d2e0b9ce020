use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;

use super::monster::{ElementType, MonsterTemplate};
use super::move_manager::{MoveData, MoveRepository};

/// Template entry as stored on disk: moves are referenced by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub element: ElementType,
    pub level: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub moves: std::collections::HashMap<String, MoveData>,
    pub starters: Vec<TemplateEntry>,
    pub wild: Vec<TemplateEntry>,
}

/// Starter and wild creature templates plus the move table
#[derive(Debug, Clone)]
pub struct MonsterCatalog {
    moves: MoveRepository,
    starters: Vec<MonsterTemplate>,
    wild: Vec<MonsterTemplate>,
}

impl MonsterCatalog {
    /// The built-in catalog
    pub fn builtin() -> Self {
        let entry = |id: &str, name: &str, element, level, max_hp, attack, defense, speed, moves: &[&str]| TemplateEntry {
            id: id.to_string(),
            name: name.to_string(),
            element,
            level,
            max_hp,
            attack,
            defense,
            speed,
            moves: moves.iter().map(|m| m.to_string()).collect(),
            image_url: None,
        };

        let file = CatalogFile {
            moves: MoveRepository::builtin().moves,
            starters: vec![
                entry("1", "Pyrolin", ElementType::Fire, 5, 45, 49, 49, 45, &["TACKLE", "EMBER"]),
                entry("2", "Aquafin", ElementType::Water, 5, 44, 48, 65, 43, &["TACKLE", "WATER_GUN"]),
                entry("3", "Leafox", ElementType::Grass, 5, 45, 49, 49, 45, &["TACKLE", "VINE_WHIP"]),
            ],
            wild: vec![
                entry("w1", "Sparky", ElementType::Electric, 3, 35, 55, 40, 90, &["TACKLE", "THUNDER_SHOCK"]),
                entry("w2", "Grom", ElementType::Normal, 4, 50, 45, 50, 30, &["TACKLE"]),
            ],
        };

        // The built-in data references only moves it defines.
        match Self::from_file(file) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("built-in catalog is invalid: {}", e),
        }
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &str) -> Result<Self, CatalogError> {
        let file = File::open(Path::new(path)).map_err(|source| CatalogError::Io {
            path: path.to_string(),
            source,
        })?;
        let reader = BufReader::new(file);
        let catalog_file: CatalogFile = serde_json::from_reader(reader)?;
        let catalog = Self::from_file(catalog_file)?;
        info!(
            "Loaded catalog from {}: {} moves, {} starters, {} wild",
            path,
            catalog.moves.len(),
            catalog.starters.len(),
            catalog.wild.len()
        );
        Ok(catalog)
    }

    /// Resolve move references and validate every template
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let moves = MoveRepository::new(file.moves);
        let starters = file
            .starters
            .iter()
            .map(|entry| resolve_template(entry, &moves))
            .collect::<Result<Vec<_>, _>>()?;
        let wild = file
            .wild
            .iter()
            .map(|entry| resolve_template(entry, &moves))
            .collect::<Result<Vec<_>, _>>()?;

        if starters.is_empty() {
            return Err(CatalogError::NoStarters);
        }
        if wild.is_empty() {
            return Err(CatalogError::NoWildMonsters);
        }

        Ok(MonsterCatalog { moves, starters, wild })
    }

    pub fn moves(&self) -> &MoveRepository {
        &self.moves
    }

    pub fn starters(&self) -> &[MonsterTemplate] {
        &self.starters
    }

    pub fn wild_templates(&self) -> &[MonsterTemplate] {
        &self.wild
    }

    pub fn starter(&self, id: &str) -> Option<&MonsterTemplate> {
        self.starters.iter().find(|t| t.id == id)
    }

    /// Uniformly random wild template
    pub fn random_wild<R: Rng>(&self, rng: &mut R) -> Option<&MonsterTemplate> {
        self.wild.choose(rng)
    }
}

fn resolve_template(entry: &TemplateEntry, moves: &MoveRepository) -> Result<MonsterTemplate, CatalogError> {
    if entry.moves.is_empty() {
        return Err(CatalogError::NoMoves { monster: entry.name.clone() });
    }
    if entry.max_hp == 0 {
        return Err(CatalogError::InvalidStat { monster: entry.name.clone(), stat: "max_hp" });
    }
    if entry.defense == 0 {
        return Err(CatalogError::InvalidStat { monster: entry.name.clone(), stat: "defense" });
    }

    let resolved = entry
        .moves
        .iter()
        .map(|key| {
            moves.get_move(key).cloned().ok_or_else(|| CatalogError::UnknownMove {
                monster: entry.name.clone(),
                key: key.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let image_url = entry
        .image_url
        .clone()
        .unwrap_or_else(|| format!("https://picsum.photos/seed/{}/200/200", entry.name.to_lowercase()));

    Ok(MonsterTemplate {
        id: entry.id.clone(),
        name: entry.name.clone(),
        element: entry.element,
        level: entry.level,
        max_hp: entry.max_hp,
        attack: entry.attack,
        defense: entry.defense,
        speed: entry.speed,
        moves: resolved,
        image_url,
    })
}
