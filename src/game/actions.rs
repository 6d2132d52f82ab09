//! # Action System
//!
//! The turn-action resolver. One player action is validated and applied per
//! turn; if it resolved, every AI-controlled entity then takes exactly one
//! action in list order. All outcomes are explicit [`ActionResult`] values,
//! and every state change the player should hear about lands in the message
//! log.

use crate::{
    AiBehavior, DeathHook, DelveResult, Direction, EntityId, GameCompletionState, GameState,
    Position, Severity, UseEffect,
};
use pathfinding::prelude::astar;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where the resolver is within the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the player's next action
    AwaitingInput,
    /// The action passed the turn-level checks
    ActionValidated,
    /// The player's action has been applied
    ActionApplied,
    /// AI-controlled entities are acting
    AiResolution,
    /// The turn is finished
    #[default]
    Idle,
}

/// Discrete player intents produced by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Step by a delta, attacking whatever combatant stands there
    Move { dx: i32, dy: i32 },
    /// Take the stairs down
    Descend,
    /// Pick up the first item on the current cell
    PickUp,
    /// Drop the inventory item at this index
    Drop(usize),
    /// Use or equip/unequip the inventory item at this index
    Use(usize),
    /// End the session
    Quit,
    /// Input that maps to nothing, including a cancelled menu
    NoAction,
}

impl PlayerAction {
    /// One step in a direction.
    pub fn step(direction: Direction) -> Self {
        let delta = direction.to_delta();
        PlayerAction::Move {
            dx: delta.x,
            dy: delta.y,
        }
    }
}

/// Outcome of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionResult {
    /// The action happened and took the turn
    Performed,
    /// The action was invalid; nothing changed
    Rejected(String),
    /// The action had no valid target; nothing was consumed
    Cancelled(String),
    /// No game time passed
    Ignored,
}

impl ActionResult {
    pub fn is_performed(&self) -> bool {
        matches!(self, ActionResult::Performed)
    }
}

/// What an AI controller decided to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAction {
    Move { dx: i32, dy: i32 },
    Wait,
}

impl GameState {
    /// Resolves one full turn for the player.
    ///
    /// A performed action is followed by one AI action per AI-controlled
    /// entity. Rejected, cancelled and ignored actions leave the AI idle and
    /// the turn counter unchanged.
    pub fn play_turn(&mut self, action: PlayerAction) -> DelveResult<ActionResult> {
        self.phase = TurnPhase::AwaitingInput;
        if self.is_over() {
            self.phase = TurnPhase::Idle;
            return Ok(ActionResult::Rejected("The game is over.".to_string()));
        }

        let player_id = self.player_id;
        let result = match action {
            PlayerAction::NoAction => ActionResult::Ignored,
            PlayerAction::Quit => {
                self.completion_state = GameCompletionState::Quit;
                log::info!("Player quit on turn {}", self.turn_number);
                ActionResult::Ignored
            }
            action => {
                self.phase = TurnPhase::ActionValidated;
                let result = match action {
                    PlayerAction::Move { dx, dy } => self.move_or_attack(player_id, dx, dy),
                    PlayerAction::Descend => match self.descend(player_id) {
                        Ok(result) => result,
                        Err(e) => {
                            self.phase = TurnPhase::Idle;
                            return Err(e);
                        }
                    },
                    PlayerAction::PickUp => self.pick_up(player_id),
                    PlayerAction::Drop(index) => self.drop_item(player_id, index),
                    PlayerAction::Use(index) => self.use_item(player_id, index),
                    PlayerAction::Quit | PlayerAction::NoAction => ActionResult::Ignored,
                };
                self.phase = TurnPhase::ActionApplied;
                result
            }
        };

        if let ActionResult::Rejected(reason) = &result {
            log::debug!("Rejected {:?}: {}", action, reason);
        }

        self.recompute_fov_if_dirty();

        if result.is_performed() {
            if !self.is_over() {
                self.phase = TurnPhase::AiResolution;
                self.run_ai_phase();
            }
            self.turn_number += 1;
        }

        self.phase = TurnPhase::Idle;
        Ok(result)
    }

    /// Moves a combatant by `(dx, dy)`, or attacks the combatant standing at
    /// the destination.
    pub fn move_or_attack(&mut self, actor_id: EntityId, dx: i32, dy: i32) -> ActionResult {
        let Some(actor) = self.entity(actor_id) else {
            return ActionResult::Rejected("No such entity.".to_string());
        };
        if actor.combatant.is_none() {
            return ActionResult::Rejected(format!("The {} cannot move.", actor.name));
        }
        let Some(from) = actor.position else {
            return ActionResult::Rejected(format!("The {} is not on the map.", actor.name));
        };

        let destination = from.offset(dx, dy);
        if !self.grid.in_bounds(destination) {
            return ActionResult::Rejected("That way lies the edge of the world.".to_string());
        }

        let target = self
            .entity_at(destination, Some(actor_id), |e| e.combatant.is_some())
            .map(|e| e.id);
        if let Some(target_id) = target {
            self.attack(actor_id, target_id);
            return ActionResult::Performed;
        }

        if self.grid.is_blocked(destination) {
            return ActionResult::Rejected("The way is blocked.".to_string());
        }

        if let Some(actor) = self.entity_mut(actor_id) {
            actor.position = Some(destination);
        }
        if actor_id == self.player_id {
            self.fov.mark_dirty();
            self.statistics.steps_taken += 1;
        }
        ActionResult::Performed
    }

    /// Melee attack: the attacker's dice roll is dealt in full.
    pub fn attack(&mut self, attacker_id: EntityId, target_id: EntityId) {
        let Some((attacker_name, dice)) = self.entity(attacker_id).and_then(|attacker| {
            attacker
                .combatant
                .as_ref()
                .map(|c| (attacker.combat_name().to_string(), c.attack))
        }) else {
            return;
        };
        let Some(target_name) = self.entity(target_id).map(|t| t.combat_name().to_string()) else {
            return;
        };

        let damage = dice.roll(&mut self.rng);
        self.message(
            format!("{} attacks {} for {} damage!", attacker_name, target_name, damage),
            Severity::Combat,
        );
        if attacker_id == self.player_id {
            self.statistics.damage_dealt += damage.max(0) as u64;
        }
        self.take_damage(target_id, damage);
    }

    /// Applies damage and fires the death hook on the killing blow.
    /// Returns whether the target died from this hit.
    pub fn take_damage(&mut self, target_id: EntityId, damage: i32) -> bool {
        let Some(target) = self.entity_mut(target_id) else {
            return false;
        };
        let name = target.combat_name().to_string();
        let Some(combatant) = target.combatant.as_mut() else {
            return false;
        };
        let died = combatant.take_damage(damage);
        let (hp, max_hp, hook) = (combatant.hp, combatant.max_hp, combatant.on_death);

        if target_id == self.player_id {
            self.statistics.damage_taken += damage.max(0) as u64;
        }
        self.message(format!("{}'s hp is {}/{}", name, hp, max_hp), Severity::Info);
        if died {
            self.on_death(target_id, hook, &name);
        }
        died
    }

    fn on_death(&mut self, id: EntityId, hook: DeathHook, name: &str) {
        match hook {
            DeathHook::None => {}
            DeathHook::Monster => {
                self.message(format!("{} is dead!", name), Severity::Death);
                if let Some(entity) = self.entity_mut(id) {
                    entity.combatant = None;
                    entity.ai = None;
                }
                self.remove_entity(id);
                self.statistics.enemies_defeated += 1;
                log::debug!("{} died and was removed", name);
            }
            DeathHook::Player => {
                self.message("You died!", Severity::Death);
                self.completion_state = GameCompletionState::PlayerDied;
                log::info!("Player died on turn {} at depth {}", self.turn_number, self.depth);
            }
        }
    }

    /// Moves the first item on the actor's cell into its inventory.
    pub fn pick_up(&mut self, actor_id: EntityId) -> ActionResult {
        let Some(actor) = self.entity(actor_id) else {
            return ActionResult::Rejected("No such entity.".to_string());
        };
        let Some(pos) = actor.position else {
            return ActionResult::Rejected(format!("The {} is not on the map.", actor.name));
        };
        let Some(inventory) = actor.inventory.as_ref() else {
            return ActionResult::Rejected(format!("The {} cannot carry anything.", actor.name));
        };
        let Some(index) = self
            .entities
            .iter()
            .position(|e| e.id != actor_id && e.is_at(pos) && e.item.is_some())
        else {
            return ActionResult::Rejected("There is nothing here to pick up.".to_string());
        };

        let weight = self.entities[index].item.as_ref().map_or(0.0, |item| item.weight);
        if !inventory.can_carry(weight) {
            let text = format!("The {} is too heavy to carry.", self.entities[index].name);
            self.message(text.clone(), Severity::Info);
            return ActionResult::Rejected(text);
        }

        let mut item = self.entities.remove(index);
        item.position = None;
        let item_name = item.name.clone();
        let Some(actor) = self.entity_mut(actor_id) else {
            return ActionResult::Rejected("No such entity.".to_string());
        };
        let actor_name = actor.combat_name().to_string();
        if let Some(inventory) = actor.inventory.as_mut() {
            inventory.items.push(item);
        }

        if actor_id == self.player_id {
            self.statistics.items_collected += 1;
        }
        self.message(
            format!("{} picks up the {}.", actor_name, item_name),
            Severity::Success,
        );
        ActionResult::Performed
    }

    /// Puts an inventory item back on the actor's cell, unequipping it first.
    pub fn drop_item(&mut self, actor_id: EntityId, index: usize) -> ActionResult {
        let Some(actor) = self.entity_mut(actor_id) else {
            return ActionResult::Rejected("No such entity.".to_string());
        };
        let Some(pos) = actor.position else {
            return ActionResult::Rejected(format!("The {} is not on the map.", actor.name));
        };
        let actor_name = actor.combat_name().to_string();
        let Some(inventory) = actor.inventory.as_mut() else {
            return ActionResult::Rejected(format!("The {} carries nothing.", actor.name));
        };
        if index >= inventory.items.len() {
            return ActionResult::Rejected("No such item.".to_string());
        }

        let mut item = inventory.items.remove(index);
        let mut unequipped = None;
        if let Some(equipment) = item.equipment.as_mut() {
            if equipment.equipped {
                equipment.equipped = false;
                unequipped = Some(equipment.slot);
            }
        }
        item.position = Some(pos);
        let item_name = item.name.clone();
        self.entities.insert(0, item);

        if let Some(slot) = unequipped {
            self.message(
                format!("{} removes the {} from the {}.", actor_name, item_name, slot),
                Severity::Info,
            );
        }
        self.message(
            format!("{} drops the {}.", actor_name, item_name),
            Severity::Info,
        );
        ActionResult::Performed
    }

    /// Uses an inventory item: equipment toggles, consumables fire their
    /// effect and are used up when it takes.
    pub fn use_item(&mut self, actor_id: EntityId, index: usize) -> ActionResult {
        let Some(item) = self
            .entity(actor_id)
            .and_then(|actor| actor.inventory.as_ref())
            .and_then(|inventory| inventory.get(index))
        else {
            return ActionResult::Rejected("No such item.".to_string());
        };

        if item.equipment.is_some() {
            return self.toggle_equip(actor_id, index);
        }

        let item_id = item.id;
        let item_name = item.name.clone();
        let Some(effect) = item.item.as_ref().and_then(|i| i.on_use) else {
            let text = format!("The {} cannot be used.", item_name);
            self.message(text.clone(), Severity::Info);
            return ActionResult::Rejected(text);
        };

        let result = match effect {
            UseEffect::Heal { amount } => self.cast_heal(actor_id, amount),
            UseEffect::Lightning { damage, range } => self.cast_lightning(actor_id, damage, range),
        };

        if result.is_performed() {
            if let Some(inventory) = self.entity_mut(actor_id).and_then(|a| a.inventory.as_mut()) {
                inventory.items.retain(|i| i.id != item_id);
            }
            log::debug!("{} was used up", item_name);
        }
        result
    }

    /// Equips or unequips the item at `index`. Equipping first takes off
    /// whatever else is equipped in the same slot.
    pub fn toggle_equip(&mut self, actor_id: EntityId, index: usize) -> ActionResult {
        let Some(inventory) = self
            .entity_mut(actor_id)
            .and_then(|actor| actor.inventory.as_mut())
        else {
            return ActionResult::Rejected("No such item.".to_string());
        };
        let Some((slot, equipped, name)) = inventory.items.get(index).and_then(|item| {
            item.equipment
                .as_ref()
                .map(|e| (e.slot, e.equipped, item.name.clone()))
        }) else {
            return ActionResult::Rejected("That cannot be equipped.".to_string());
        };

        let mut lines = Vec::new();
        if equipped {
            if let Some(equipment) = inventory.items[index].equipment.as_mut() {
                equipment.equipped = false;
            }
            lines.push(format!("Removed {} from {}.", name, slot));
        } else {
            if let Some(other) = inventory.equipped_index_in_slot(slot) {
                if let Some(equipment) = inventory.items[other].equipment.as_mut() {
                    equipment.equipped = false;
                }
                lines.push(format!("Removed {} from {}.", inventory.items[other].name, slot));
            }
            if let Some(equipment) = inventory.items[index].equipment.as_mut() {
                equipment.equipped = true;
            }
            lines.push(format!("Equipped {} on {}.", name, slot));
        }

        for line in lines {
            self.message(line, Severity::Info);
        }
        ActionResult::Performed
    }

    fn cast_heal(&mut self, actor_id: EntityId, amount: i32) -> ActionResult {
        let Some(actor) = self.entity_mut(actor_id) else {
            return ActionResult::Rejected("No such entity.".to_string());
        };
        let name = actor.combat_name().to_string();
        let Some(combatant) = actor.combatant.as_mut() else {
            return ActionResult::Rejected(format!("{} has no wounds to heal.", name));
        };
        if combatant.hp >= combatant.max_hp {
            let text = "You are already at full health.".to_string();
            self.message(text.clone(), Severity::Info);
            return ActionResult::Cancelled(text);
        }
        let healed = combatant.heal(amount);
        self.message(
            format!("{}'s wounds start to feel better! (+{} hp)", name, healed),
            Severity::Success,
        );
        ActionResult::Performed
    }

    /// Strikes the nearest visible combatant within `range`. Strictly closer
    /// targets win, so ties keep the earlier entity.
    fn cast_lightning(&mut self, caster_id: EntityId, damage: i32, range: f64) -> ActionResult {
        let Some(origin) = self.entity(caster_id).and_then(|c| c.position) else {
            return ActionResult::Rejected("The caster is not on the map.".to_string());
        };

        let mut closest: Option<(EntityId, f64)> = None;
        for entity in &self.entities {
            if entity.id == caster_id || entity.combatant.is_none() {
                continue;
            }
            let Some(pos) = entity.position else {
                continue;
            };
            if !self.fov.is_visible(pos) {
                continue;
            }
            let distance = origin.euclidean_distance(pos);
            if distance <= range && closest.map_or(true, |(_, best)| distance < best) {
                closest = Some((entity.id, distance));
            }
        }

        let Some((target_id, _)) = closest else {
            let text = "No enemy is close enough to strike.".to_string();
            self.message(text.clone(), Severity::Info);
            return ActionResult::Cancelled(text);
        };

        let target_name = self
            .entity(target_id)
            .map(|t| t.combat_name().to_string())
            .unwrap_or_default();
        self.message(
            format!(
                "A lightning bolt strikes {} with a loud thunder! The damage is {}.",
                target_name, damage
            ),
            Severity::Combat,
        );
        if caster_id == self.player_id {
            self.statistics.damage_dealt += damage.max(0) as u64;
        }
        self.take_damage(target_id, damage);
        ActionResult::Performed
    }

    /// Takes the stairs when the actor stands on them.
    pub fn descend(&mut self, actor_id: EntityId) -> DelveResult<ActionResult> {
        let Some(pos) = self.entity(actor_id).and_then(|a| a.position) else {
            return Ok(ActionResult::Rejected("No such entity.".to_string()));
        };
        if !self.grid.has_stairs(pos) {
            return Ok(ActionResult::Rejected("There are no stairs here.".to_string()));
        }
        if actor_id != self.player_id {
            return Ok(ActionResult::Rejected("Only the player can take the stairs.".to_string()));
        }
        self.advance_level()?;
        Ok(ActionResult::Performed)
    }

    /// Gives every AI-controlled entity one action, in list order. Entities
    /// killed earlier in the phase are skipped.
    pub fn run_ai_phase(&mut self) {
        let actors: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.ai.is_some())
            .map(|e| e.id)
            .collect();

        for id in actors {
            if self.is_over() {
                break;
            }
            if self.entity(id).map_or(true, |e| e.ai.is_none()) {
                continue;
            }
            if let AiAction::Move { dx, dy } = self.decide_ai_action(id) {
                self.move_or_attack(id, dx, dy);
            }
        }
    }

    /// Asks an entity's AI controller for its next action.
    pub fn decide_ai_action(&mut self, id: EntityId) -> AiAction {
        let Some((behavior, from)) = self
            .entity(id)
            .and_then(|e| e.ai.as_ref().zip(e.position))
            .map(|(ai, pos)| (ai.behavior, pos))
        else {
            return AiAction::Wait;
        };

        match behavior {
            AiBehavior::Wander => self.wander(),
            AiBehavior::Hunter => self.hunt(id, from).unwrap_or_else(|| self.wander()),
        }
    }

    fn wander(&mut self) -> AiAction {
        AiAction::Move {
            dx: self.rng.gen_range(-1..=1),
            dy: self.rng.gen_range(-1..=1),
        }
    }

    /// Next step towards the player, if the hunter is in view of them and a
    /// path exists.
    fn hunt(&self, hunter_id: EntityId, from: Position) -> Option<AiAction> {
        if !self.fov.is_visible(from) {
            return None;
        }
        let goal = self.player_position()?;
        let (path, _cost) = astar(
            &from,
            |&pos| {
                pos.adjacent_positions()
                    .into_iter()
                    .filter(|&next| {
                        !self.grid.is_blocked(next)
                            && (next == goal
                                || self
                                    .entity_at(next, Some(hunter_id), |e| e.combatant.is_some())
                                    .is_none())
                    })
                    .map(|next| (next, 1u32))
                    .collect::<Vec<_>>()
            },
            |&pos| pos.chebyshev_distance(goal),
            |&pos| pos == goal,
        )?;
        let next = *path.get(1)?;
        let step = Direction::from_delta(next - from)?.to_delta();
        Some(AiAction::Move {
            dx: step.x,
            dy: step.y,
        })
    }
}
