//! # Entities and Components
//!
//! An entity is a plain record: a position, a glyph, a name and a set of
//! optional capability components. What an entity can do is the union of the
//! components it carries; there are no entity subtypes.
//!
//! Every component stores the id of the entity it was attached to. The
//! back-reference is only used for lookups; ownership always flows from the
//! entity to its components.

use crate::{new_entity_id, DelveError, EntityId, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A `count`d`sides` dice expression.
///
/// # Examples
///
/// ```
/// use delve::Dice;
///
/// let dice: Dice = "2d6".parse().unwrap();
/// assert_eq!(dice, Dice::new(2, 6));
/// assert_eq!(dice.to_string(), "2d6");
/// assert_eq!((dice.min(), dice.max()), (2, 12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
}

impl Dice {
    pub fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    /// Sums `count` independent uniform rolls in `[1, sides]`.
    ///
    /// Zero-sided dice always roll 0.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.sides == 0 {
            return 0;
        }
        (0..self.count)
            .map(|_| rng.gen_range(1..=self.sides) as i32)
            .sum()
    }

    pub fn min(&self) -> i32 {
        if self.sides == 0 {
            0
        } else {
            self.count as i32
        }
    }

    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl FromStr for Dice {
    type Err = DelveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DelveError::InvalidConfig(format!("'{}' is not a dice expression", s));
        let (count, sides) = s.trim().split_once(['d', 'D']).ok_or_else(invalid)?;
        let count = count.parse().map_err(|_| invalid())?;
        let sides = sides.parse().map_err(|_| invalid())?;
        Ok(Dice::new(count, sides))
    }
}

/// What happens when a combatant's hit points run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathHook {
    /// Scenery and training dummies: nothing happens
    None,
    /// Strip combat and AI, log the death, remove from the map
    Monster,
    /// End the game
    Player,
}

/// Something that has hit points and can fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    owner: EntityId,
    /// Name of the individual, e.g. "Agrk"
    pub instance_name: String,
    pub max_hp: i32,
    pub hp: i32,
    /// Raw damage rolled on every melee hit
    pub attack: Dice,
    /// Tracked but not subtracted from incoming damage
    pub base_defense: i32,
    pub on_death: DeathHook,
}

impl Combatant {
    /// Creates a combatant at full health.
    pub fn new(
        instance_name: impl Into<String>,
        max_hp: i32,
        attack: Dice,
        base_defense: i32,
        on_death: DeathHook,
    ) -> Self {
        Self {
            owner: Uuid::nil(),
            instance_name: instance_name.into(),
            max_hp,
            hp: max_hp,
            attack,
            base_defense,
            on_death,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtracts damage. Returns true only on the hit that takes a living
    /// combatant to zero or below.
    pub fn take_damage(&mut self, damage: i32) -> bool {
        let was_alive = self.is_alive();
        self.hp -= damage;
        was_alive && !self.is_alive()
    }

    /// Restores hit points up to the maximum and returns the amount healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }
}

/// Closed set of AI behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiBehavior {
    /// Stagger in a random direction every turn
    Wander,
    /// Chase the player while in sight of them, wander otherwise
    Hunter,
}

/// Marks an entity as driven by the AI phase of each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiController {
    owner: EntityId,
    pub behavior: AiBehavior,
}

impl AiController {
    pub fn new(behavior: AiBehavior) -> Self {
        Self {
            owner: Uuid::nil(),
            behavior,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }
}

/// Named equipment attachment points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    MainHand,
    OffHand,
    Head,
    Body,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::MainHand => "main hand",
            Slot::OffHand => "off hand",
            Slot::Head => "head",
            Slot::Body => "body",
        };
        f.write_str(name)
    }
}

/// Effect triggered when a consumable item is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UseEffect {
    /// Restore hit points to the user
    Heal { amount: i32 },
    /// Strike the nearest visible hostile within `range`
    Lightning { damage: i32, range: f64 },
}

/// Makes an entity something that can be picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    owner: EntityId,
    pub weight: f32,
    pub on_use: Option<UseEffect>,
}

impl Item {
    pub fn new(weight: f32, on_use: Option<UseEffect>) -> Self {
        Self {
            owner: Uuid::nil(),
            weight,
            on_use,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }
}

/// Makes an item wearable or wieldable.
///
/// Bonuses are recorded for display; the combat formula does not read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    owner: EntityId,
    pub slot: Slot,
    pub equipped: bool,
    pub attack: Option<Dice>,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
}

impl Equipment {
    pub fn new(slot: Slot, attack: Option<Dice>, attack_bonus: i32, defense_bonus: i32) -> Self {
        Self {
            owner: Uuid::nil(),
            slot,
            equipped: false,
            attack,
            attack_bonus,
            defense_bonus,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }
}

/// Carried items, in acquisition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    owner: EntityId,
    pub items: Vec<Entity>,
    pub max_weight: f32,
}

impl Inventory {
    pub fn new(max_weight: f32) -> Self {
        Self {
            owner: Uuid::nil(),
            items: Vec::new(),
            max_weight,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.items.get(index)
    }

    pub fn total_weight(&self) -> f32 {
        self.items
            .iter()
            .filter_map(|entity| entity.item.as_ref())
            .map(|item| item.weight)
            .sum()
    }

    pub fn can_carry(&self, weight: f32) -> bool {
        self.total_weight() + weight <= self.max_weight
    }

    /// Index of the item currently equipped in `slot`, if any.
    pub fn equipped_index_in_slot(&self, slot: Slot) -> Option<usize> {
        self.items.iter().position(|entity| {
            entity
                .equipment
                .as_ref()
                .map_or(false, |equipment| equipment.equipped && equipment.slot == slot)
        })
    }

    /// The item currently equipped in `slot`, if any.
    pub fn equipped_in_slot(&self, slot: Slot) -> Option<&Entity> {
        self.equipped_index_in_slot(slot)
            .and_then(|index| self.items.get(index))
    }

    fn equipped(&self) -> impl Iterator<Item = &Equipment> {
        self.items
            .iter()
            .filter_map(|entity| entity.equipment.as_ref())
            .filter(|equipment| equipment.equipped)
    }

    pub fn attack_bonus(&self) -> i32 {
        self.equipped().map(|equipment| equipment.attack_bonus).sum()
    }

    pub fn defense_bonus(&self) -> i32 {
        self.equipped().map(|equipment| equipment.defense_bonus).sum()
    }
}

/// Component kinds, for capability probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Combatant,
    Ai,
    Inventory,
    Item,
    Equipment,
}

/// Anything that occupies a cell or sits in an inventory.
///
/// # Examples
///
/// ```
/// use delve::{Capability, Combatant, DeathHook, Dice, Entity, Position};
///
/// let goblin = Entity::new(Position::new(3, 4), 'g', "goblin")
///     .with_combatant(Combatant::new("Snik", 10, Dice::new(1, 6), 0, DeathHook::Monster));
///
/// assert!(goblin.has(Capability::Combatant));
/// assert!(!goblin.has(Capability::Item));
/// assert_eq!(goblin.display_name(), "Snik the goblin");
/// assert_eq!(goblin.combatant.as_ref().unwrap().owner(), goblin.id);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// None while carried in an inventory
    pub position: Option<Position>,
    pub glyph: char,
    pub name: String,
    pub combatant: Option<Combatant>,
    pub ai: Option<AiController>,
    pub inventory: Option<Inventory>,
    pub item: Option<Item>,
    pub equipment: Option<Equipment>,
}

impl Entity {
    /// Creates a bare entity on the map with a fresh id.
    pub fn new(position: Position, glyph: char, name: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            position: Some(position),
            glyph,
            name: name.into(),
            combatant: None,
            ai: None,
            inventory: None,
            item: None,
            equipment: None,
        }
    }

    pub fn with_combatant(mut self, mut combatant: Combatant) -> Self {
        combatant.owner = self.id;
        self.combatant = Some(combatant);
        self
    }

    pub fn with_ai(mut self, mut ai: AiController) -> Self {
        ai.owner = self.id;
        self.ai = Some(ai);
        self
    }

    pub fn with_inventory(mut self, mut inventory: Inventory) -> Self {
        inventory.owner = self.id;
        self.inventory = Some(inventory);
        self
    }

    pub fn with_item(mut self, mut item: Item) -> Self {
        item.owner = self.id;
        self.item = Some(item);
        self
    }

    pub fn with_equipment(mut self, mut equipment: Equipment) -> Self {
        equipment.owner = self.id;
        self.equipment = Some(equipment);
        self
    }

    /// Capability probe.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Combatant => self.combatant.is_some(),
            Capability::Ai => self.ai.is_some(),
            Capability::Inventory => self.inventory.is_some(),
            Capability::Item => self.item.is_some(),
            Capability::Equipment => self.equipment.is_some(),
        }
    }

    pub fn is_at(&self, pos: Position) -> bool {
        self.position == Some(pos)
    }

    /// Name used in menus and the status line.
    pub fn display_name(&self) -> String {
        if let Some(combatant) = &self.combatant {
            return format!("{} the {}", combatant.instance_name, self.name);
        }
        match &self.equipment {
            Some(equipment) if equipment.equipped => {
                format!("{} (on {})", self.name, equipment.slot)
            }
            _ => self.name.clone(),
        }
    }

    /// Name used in combat messages: the individual's name when there is one.
    pub fn combat_name(&self) -> &str {
        self.combatant
            .as_ref()
            .map_or(self.name.as_str(), |combatant| combatant.instance_name.as_str())
    }

    pub fn is_equipped(&self) -> bool {
        self.equipment
            .as_ref()
            .map_or(false, |equipment| equipment.equipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sword() -> Entity {
        Entity::new(Position::new(0, 0), '/', "sword")
            .with_item(Item::new(3.0, None))
            .with_equipment(Equipment::new(Slot::MainHand, Some(Dice::new(1, 8)), 2, 0))
    }

    #[test]
    fn test_dice_roll_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let dice = Dice::new(3, 4);
        for _ in 0..200 {
            let roll = dice.roll(&mut rng);
            assert!((3..=12).contains(&roll), "roll {} out of range", roll);
        }
    }

    #[test]
    fn test_dice_roll_is_seeded() {
        let dice = Dice::new(2, 20);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(dice.roll(&mut a), dice.roll(&mut b));
    }

    #[test]
    fn test_degenerate_dice() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Dice::new(3, 0).roll(&mut rng), 0);
        assert_eq!(Dice::new(0, 6).roll(&mut rng), 0);
        assert_eq!(Dice::new(3, 0).min(), 0);
    }

    #[test]
    fn test_dice_parse_errors() {
        assert!("d6".parse::<Dice>().is_err());
        assert!("2x6".parse::<Dice>().is_err());
        assert!("2d".parse::<Dice>().is_err());
        assert_eq!(" 1D8 ".parse::<Dice>().unwrap(), Dice::new(1, 8));
    }

    #[test]
    fn test_components_point_back_to_owner() {
        let entity = Entity::new(Position::new(1, 1), '@', "adventurer")
            .with_combatant(Combatant::new("Hero", 30, Dice::new(1, 6), 1, DeathHook::Player))
            .with_ai(AiController::new(AiBehavior::Wander))
            .with_inventory(Inventory::new(20.0));
        let item = sword();

        assert_eq!(entity.combatant.as_ref().unwrap().owner(), entity.id);
        assert_eq!(entity.ai.as_ref().unwrap().owner(), entity.id);
        assert_eq!(entity.inventory.as_ref().unwrap().owner(), entity.id);
        assert_eq!(item.item.as_ref().unwrap().owner(), item.id);
        assert_eq!(item.equipment.as_ref().unwrap().owner(), item.id);
    }

    #[test]
    fn test_display_name() {
        let mut item = sword();
        assert_eq!(item.display_name(), "sword");
        item.equipment.as_mut().unwrap().equipped = true;
        assert_eq!(item.display_name(), "sword (on main hand)");
        assert_eq!(item.combat_name(), "sword");
    }

    #[test]
    fn test_take_damage_reports_death_once() {
        let mut combatant = Combatant::new("Agrk", 5, Dice::new(1, 4), 0, DeathHook::Monster);
        assert!(!combatant.take_damage(3));
        assert!(combatant.take_damage(4));
        assert!(!combatant.take_damage(4));
        assert_eq!(combatant.hp, -6);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut combatant = Combatant::new("Agrk", 10, Dice::new(1, 4), 0, DeathHook::Monster);
        combatant.take_damage(3);
        assert_eq!(combatant.heal(10), 3);
        assert_eq!(combatant.hp, 10);
        assert_eq!(combatant.heal(5), 0);
    }

    #[test]
    fn test_inventory_slot_queries() {
        let mut inventory = Inventory::new(10.0);
        let mut first = sword();
        let mut second = sword();
        second.equipment.as_mut().unwrap().equipped = true;
        first.position = None;
        second.position = None;
        let second_id = second.id;
        inventory.items.push(first);
        inventory.items.push(second);

        assert_eq!(inventory.equipped_index_in_slot(Slot::MainHand), Some(1));
        assert_eq!(inventory.equipped_in_slot(Slot::MainHand).map(|e| e.id), Some(second_id));
        assert!(inventory.equipped_in_slot(Slot::OffHand).is_none());
        assert_eq!(inventory.attack_bonus(), 2);
        assert_eq!(inventory.total_weight(), 6.0);
        assert!(inventory.can_carry(4.0));
        assert!(!inventory.can_carry(4.5));
    }
}
