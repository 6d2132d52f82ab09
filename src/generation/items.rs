//! # Item Generation
//!
//! Item templates and floor-item placement.

use crate::generation::utils;
use crate::{
    DelveError, DelveResult, Dice, Entity, Equipment, GenerationConfig, Generator, Grid, Item,
    Position, Slot, UseEffect,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Equipment half of an item template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    pub slot: Slot,
    pub attack: Option<Dice>,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
}

/// Everything needed to spawn one kind of item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub name: String,
    pub glyph: char,
    pub weight: f32,
    pub on_use: Option<UseEffect>,
    pub equipment: Option<EquipmentTemplate>,
}

impl ItemTemplate {
    pub fn healing_potion() -> Self {
        Self {
            name: "healing potion".to_string(),
            glyph: '!',
            weight: 0.5,
            on_use: Some(UseEffect::Heal {
                amount: crate::config::DEFAULT_HEAL_AMOUNT,
            }),
            equipment: None,
        }
    }

    pub fn scroll_of_lightning() -> Self {
        Self {
            name: "scroll of lightning".to_string(),
            glyph: '?',
            weight: 0.1,
            on_use: Some(UseEffect::Lightning {
                damage: crate::config::DEFAULT_LIGHTNING_DAMAGE,
                range: crate::config::DEFAULT_LIGHTNING_RANGE,
            }),
            equipment: None,
        }
    }

    pub fn short_sword() -> Self {
        Self {
            name: "short sword".to_string(),
            glyph: '/',
            weight: 3.0,
            on_use: None,
            equipment: Some(EquipmentTemplate {
                slot: Slot::MainHand,
                attack: Some(Dice::new(1, 6)),
                attack_bonus: 2,
                defense_bonus: 0,
            }),
        }
    }

    pub fn wooden_shield() -> Self {
        Self {
            name: "wooden shield".to_string(),
            glyph: '[',
            weight: 5.0,
            on_use: None,
            equipment: Some(EquipmentTemplate {
                slot: Slot::OffHand,
                attack: None,
                attack_bonus: 0,
                defense_bonus: 1,
            }),
        }
    }

    /// Builds the item lying on the floor at `position`.
    pub fn spawn(&self, position: Position) -> Entity {
        let entity = Entity::new(position, self.glyph, self.name.clone())
            .with_item(Item::new(self.weight, self.on_use));
        match self.equipment {
            Some(equipment) => entity.with_equipment(Equipment::new(
                equipment.slot,
                equipment.attack,
                equipment.attack_bonus,
                equipment.defense_bonus,
            )),
            None => entity,
        }
    }
}

/// Scatters `count` floor items over random free cells.
#[derive(Debug, Clone)]
pub struct ItemGenerator<'a> {
    pub grid: &'a Grid,
    pub occupied: Vec<Position>,
    pub templates: &'a [ItemTemplate],
    pub count: u32,
}

impl<'a> ItemGenerator<'a> {
    pub fn new(grid: &'a Grid, templates: &'a [ItemTemplate], count: u32) -> Self {
        Self {
            grid,
            occupied: Vec::new(),
            templates,
            count,
        }
    }

    pub fn avoiding(mut self, occupied: impl IntoIterator<Item = Position>) -> Self {
        self.occupied.extend(occupied);
        self
    }
}

impl Generator<Vec<Entity>> for ItemGenerator<'_> {
    fn generate(&self, _config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Vec<Entity>> {
        let mut taken = self.occupied.clone();
        let mut items = Vec::new();

        for _ in 0..self.count {
            let Some(template) = self.templates.choose(rng) else {
                break;
            };
            let Some(pos) = utils::random_free_position(self.grid, &taken, rng) else {
                break;
            };
            taken.push(pos);
            items.push(template.spawn(pos));
        }

        log::debug!("{} placed {} items", self.generator_type(), items.len());
        Ok(items)
    }

    fn validate(&self, items: &Vec<Entity>, _config: &GenerationConfig) -> DelveResult<()> {
        for item in items {
            if item.item.is_none() {
                return Err(DelveError::GenerationFailed(format!(
                    "{} cannot be picked up",
                    item.name
                )));
            }
            match item.position {
                Some(pos) if !self.grid.is_blocked(pos) => {}
                _ => {
                    return Err(DelveError::GenerationFailed(format!(
                        "{} is not on a floor cell",
                        item.name
                    )))
                }
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ItemGenerator"
    }
}
