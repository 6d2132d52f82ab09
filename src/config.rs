//! # Configuration
//!
//! Default constants and the [`GameConfig`] document that bundles every
//! tunable input of a session: generation bounds, field of view, the player
//! template and the spawn tables.

use crate::{
    Combatant, DeathHook, DelveError, DelveResult, Dice, Entity, FovConfig, GenerationConfig,
    Inventory, ItemTemplate, MonsterTemplate, Position,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default map width
pub const DEFAULT_MAP_WIDTH: u32 = 20;

/// Default map height
pub const DEFAULT_MAP_HEIGHT: u32 = 20;

/// Room placement attempts per level
pub const DEFAULT_MAX_ROOMS: u32 = 4;

/// Minimum room size
pub const DEFAULT_ROOM_MIN_SIZE: u32 = 4;

/// Maximum room size
pub const DEFAULT_ROOM_MAX_SIZE: u32 = 6;

/// Regeneration attempts before a degenerate level is reported
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Sight radius
pub const DEFAULT_FOV_RADIUS: u32 = 4;

pub const DEFAULT_FOV_LIGHT_WALLS: bool = true;

pub const DEFAULT_PLAYER_MAX_HP: i32 = 10;

pub const DEFAULT_CARRY_WEIGHT: f32 = 20.0;

pub const DEFAULT_HEAL_AMOUNT: i32 = 4;

pub const DEFAULT_LIGHTNING_DAMAGE: i32 = 10;

pub const DEFAULT_LIGHTNING_RANGE: f64 = 5.0;

pub const DEFAULT_MONSTERS_PER_LEVEL: u32 = 2;

pub const DEFAULT_ITEMS_PER_LEVEL: u32 = 2;

/// Messages kept in the session log
pub const MAX_MESSAGES: usize = 100;

/// Stats of the player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTemplate {
    /// Name shown in combat messages
    pub instance_name: String,
    /// Kind name shown in menus, e.g. "Player the adventurer"
    pub name: String,
    pub glyph: char,
    pub max_hp: i32,
    pub attack: Dice,
    pub defense: i32,
    pub max_weight: f32,
}

impl PlayerTemplate {
    /// Builds the player character at `position`.
    pub fn spawn(&self, position: Position) -> Entity {
        Entity::new(position, self.glyph, self.name.clone())
            .with_combatant(Combatant::new(
                self.instance_name.clone(),
                self.max_hp,
                self.attack,
                self.defense,
                DeathHook::Player,
            ))
            .with_inventory(Inventory::new(self.max_weight))
    }
}

impl Default for PlayerTemplate {
    fn default() -> Self {
        Self {
            instance_name: "Player".to_string(),
            name: "adventurer".to_string(),
            glyph: '@',
            max_hp: DEFAULT_PLAYER_MAX_HP,
            attack: Dice::new(1, 6),
            defense: 0,
            max_weight: DEFAULT_CARRY_WEIGHT,
        }
    }
}

/// All configuration inputs of a session.
///
/// # Examples
///
/// ```
/// use delve::GameConfig;
///
/// let config = GameConfig::default();
/// assert_eq!(config.generation.width, 20);
/// assert_eq!(config.fov.radius, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generation: GenerationConfig,
    pub fov: FovConfig,
    pub player: PlayerTemplate,
    pub monsters: Vec<MonsterTemplate>,
    pub items: Vec<ItemTemplate>,
    pub monsters_per_level: u32,
    pub items_per_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            fov: FovConfig::default(),
            player: PlayerTemplate::default(),
            monsters: vec![MonsterTemplate::kobold(), MonsterTemplate::goblin()],
            items: vec![
                ItemTemplate::healing_potion(),
                ItemTemplate::scroll_of_lightning(),
                ItemTemplate::short_sword(),
                ItemTemplate::wooden_shield(),
            ],
            monsters_per_level: DEFAULT_MONSTERS_PER_LEVEL,
            items_per_level: DEFAULT_ITEMS_PER_LEVEL,
        }
    }
}

impl GameConfig {
    /// A configuration with an empty level: no monsters and no floor items.
    pub fn unpopulated() -> Self {
        Self {
            monsters_per_level: 0,
            items_per_level: 0,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&json).map_err(|e| {
            DelveError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks every section for values the engine cannot run with.
    pub fn validate(&self) -> DelveResult<()> {
        self.generation.validate()?;

        if self.player.max_hp <= 0 {
            return Err(DelveError::InvalidConfig(
                "player max_hp must be positive".to_string(),
            ));
        }
        if self.player.max_weight < 0.0 {
            return Err(DelveError::InvalidConfig(
                "player max_weight cannot be negative".to_string(),
            ));
        }
        if let Some(monster) = self.monsters.iter().find(|m| m.max_hp <= 0) {
            return Err(DelveError::InvalidConfig(format!(
                "monster '{}' needs positive max_hp",
                monster.name
            )));
        }
        if self.monsters_per_level > 0 && self.monsters.is_empty() {
            return Err(DelveError::InvalidConfig(
                "monsters_per_level is set but the monster table is empty".to_string(),
            ));
        }
        if self.items_per_level > 0 && self.items.is_empty() {
            return Err(DelveError::InvalidConfig(
                "items_per_level is set but the item table is empty".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.weight < 0.0) {
            return Err(DelveError::InvalidConfig(format!(
                "item '{}' has negative weight",
                item.name
            )));
        }
        Ok(())
    }
}
