//! # Encounter Generation
//!
//! Monster templates and their placement on a freshly carved level.

use crate::generation::utils;
use crate::{
    AiBehavior, AiController, Combatant, DeathHook, DelveError, DelveResult, Dice, Entity,
    GenerationConfig, Generator, Grid, Position,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stats and naming for one kind of monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterTemplate {
    /// Species name, e.g. "goblin"
    pub name: String,
    pub glyph: char,
    /// Pool of individual names; one is drawn per spawned monster
    pub instance_names: Vec<String>,
    pub max_hp: i32,
    pub attack: Dice,
    pub defense: i32,
    pub behavior: AiBehavior,
}

impl MonsterTemplate {
    pub fn kobold() -> Self {
        Self {
            name: "kobold".to_string(),
            glyph: 'k',
            instance_names: ["Agrk", "Yip", "Skritt", "Dek"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_hp: 10,
            attack: Dice::new(1, 6),
            defense: 0,
            behavior: AiBehavior::Wander,
        }
    }

    pub fn goblin() -> Self {
        Self {
            name: "goblin".to_string(),
            glyph: 'g',
            instance_names: ["Snik", "Grub", "Mogg", "Zat"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_hp: 10,
            attack: Dice::new(1, 6),
            defense: 0,
            behavior: AiBehavior::Hunter,
        }
    }

    /// Builds a live monster at `position`.
    pub fn spawn(&self, position: Position, rng: &mut StdRng) -> Entity {
        let instance_name = self
            .instance_names
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| self.name.clone());
        Entity::new(position, self.glyph, self.name.clone())
            .with_combatant(Combatant::new(
                instance_name,
                self.max_hp,
                self.attack,
                self.defense,
                DeathHook::Monster,
            ))
            .with_ai(AiController::new(self.behavior))
    }
}

/// Places `count` monsters on random free cells of a level.
///
/// Each monster's kind is drawn uniformly from `templates`. Cells in
/// `occupied` and cells already taken by earlier spawns are skipped; when the
/// level runs out of room fewer monsters are placed.
#[derive(Debug, Clone)]
pub struct EncounterGenerator<'a> {
    pub grid: &'a Grid,
    pub occupied: Vec<Position>,
    pub templates: &'a [MonsterTemplate],
    pub count: u32,
}

impl<'a> EncounterGenerator<'a> {
    pub fn new(grid: &'a Grid, templates: &'a [MonsterTemplate], count: u32) -> Self {
        Self {
            grid,
            occupied: Vec::new(),
            templates,
            count,
        }
    }

    /// Cells that must stay empty, e.g. the player's.
    pub fn avoiding(mut self, occupied: impl IntoIterator<Item = Position>) -> Self {
        self.occupied.extend(occupied);
        self
    }
}

impl Generator<Vec<Entity>> for EncounterGenerator<'_> {
    fn generate(&self, _config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Vec<Entity>> {
        let mut taken = self.occupied.clone();
        let mut monsters = Vec::new();
        if self.templates.is_empty() {
            return Ok(monsters);
        }

        for _ in 0..self.count {
            let Some(template) = self.templates.choose(rng) else {
                break;
            };
            let Some(pos) = utils::random_free_position(self.grid, &taken, rng) else {
                log::warn!("No free cell left for monster {} of {}", monsters.len() + 1, self.count);
                break;
            };
            taken.push(pos);
            monsters.push(template.spawn(pos, rng));
        }

        log::debug!("{} placed {} monsters", self.generator_type(), monsters.len());
        Ok(monsters)
    }

    fn validate(&self, monsters: &Vec<Entity>, _config: &GenerationConfig) -> DelveResult<()> {
        let mut seen: HashSet<Position> = self.occupied.iter().copied().collect();
        for monster in monsters {
            let pos = monster.position.ok_or_else(|| {
                DelveError::GenerationFailed(format!("{} was spawned off the map", monster.name))
            })?;
            if self.grid.is_blocked(pos) {
                return Err(DelveError::GenerationFailed(format!(
                    "{} was spawned inside a wall at {}",
                    monster.name, pos
                )));
            }
            if !seen.insert(pos) {
                return Err(DelveError::GenerationFailed(format!(
                    "{} shares the cell {}",
                    monster.name, pos
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "EncounterGenerator"
    }
}
