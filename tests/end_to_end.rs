//! End-to-end scenarios on generated 20x20 levels.

use delve::{
    ActionResult, Combatant, DeathHook, Dice, Entity, GameCompletionState, GameConfig, GameState,
    ItemTemplate, PlayerAction, Position, Slot, TurnPhase,
};

const SEED: u64 = 20_240_601;

/// 20x20 map, up to 4 rooms of size 4 to 6, nothing spawned.
fn reference_config() -> GameConfig {
    let config = GameConfig::unpopulated();
    assert_eq!(config.generation.width, 20);
    assert_eq!(config.generation.height, 20);
    assert_eq!(config.generation.max_rooms, 4);
    assert_eq!(config.generation.room_min_size, 4);
    assert_eq!(config.generation.room_max_size, 6);
    config
}

fn new_game() -> GameState {
    GameState::new(reference_config(), SEED).expect("reference level should generate")
}

fn punching_bag(pos: Position, hp: i32) -> Entity {
    Entity::new(pos, 'k', "kobold").with_combatant(Combatant::new(
        "Yip",
        hp,
        Dice::new(1, 6),
        0,
        DeathHook::Monster,
    ))
}

#[test]
fn test_generated_level_is_playable() {
    let state = new_game();
    let config = &state.config.generation;

    assert!(!state.rooms.is_empty());
    assert!(state.rooms.len() <= 4);
    for (i, room) in state.rooms.iter().enumerate() {
        assert!(room.fits_within(config.width, config.height));
        for other in &state.rooms[i + 1..] {
            assert!(!room.intersects(other), "{:?} overlaps {:?}", room, other);
        }
    }

    let start = state.rooms[0].center();
    assert_eq!(state.player_position(), Some(start));
    assert!(state.grid.is_connected_from(start));
    assert_eq!(
        state.grid.stairs_position(),
        state.rooms.last().map(|room| room.center())
    );

    assert!(state.is_visible(start));
    assert!(state.grid.is_explored(start));
    assert_eq!(state.phase(), TurnPhase::AwaitingInput);
}

#[test]
fn test_same_seed_same_level() {
    let a = new_game();
    let b = new_game();
    assert_eq!(a.grid, b.grid);
    assert_eq!(a.rooms, b.rooms);
}

#[test]
fn test_attack_adjacent_monster() {
    let mut state = new_game();
    let start = state.player_position().unwrap();
    let target_pos = start.offset(1, 0);
    assert!(!state.grid.is_blocked(target_pos));
    let target_id = state.add_entity(punching_bag(target_pos, 100));

    let expected = Dice::new(1, 6).roll(&mut state.rng().clone());
    let result = state.play_turn(PlayerAction::Move { dx: 1, dy: 0 }).unwrap();

    assert_eq!(result, ActionResult::Performed);
    assert_eq!(state.player_position(), Some(start));
    let hp = state.entity(target_id).unwrap().combatant.as_ref().unwrap().hp;
    assert_eq!(hp, 100 - expected);
    assert!(state
        .messages
        .iter()
        .any(|m| m.text == format!("Player attacks Yip for {} damage!", expected)));
    assert_eq!(state.turn_number, 1);
    assert_eq!(state.statistics.damage_dealt, expected as u64);
}

#[test]
fn test_killing_blow_removes_monster() {
    let mut state = new_game();
    let start = state.player_position().unwrap();
    let target_id = state.add_entity(punching_bag(start.offset(0, 1), 1));

    state.play_turn(PlayerAction::Move { dx: 0, dy: 1 }).unwrap();

    assert!(state.entity(target_id).is_none());
    assert_eq!(state.statistics.enemies_defeated, 1);
    assert!(state.messages.iter().any(|m| m.text == "Yip is dead!"));

    state.play_turn(PlayerAction::Move { dx: 0, dy: 1 }).unwrap();
    assert_eq!(state.player_position(), Some(start.offset(0, 1)));
}

#[test]
fn test_pick_up_and_equip() {
    let mut state = new_game();
    let here = state.player_position().unwrap();
    state.add_entity(ItemTemplate::short_sword().spawn(here));

    assert_eq!(state.play_turn(PlayerAction::PickUp).unwrap(), ActionResult::Performed);
    assert!(state.entity_at(here, Some(state.player_id), |_| true).is_none());
    assert_eq!(state.statistics.items_collected, 1);

    assert_eq!(state.play_turn(PlayerAction::Use(0)).unwrap(), ActionResult::Performed);
    let inventory = state.player().unwrap().inventory.as_ref().unwrap();
    assert!(inventory.items[0].is_equipped());
    assert_eq!(inventory.attack_bonus(), 2);
    assert_eq!(inventory.equipped_index_in_slot(Slot::MainHand), Some(0));

    // A second sword replaces the first in the main hand.
    state.add_entity(ItemTemplate::short_sword().spawn(here));
    state.play_turn(PlayerAction::PickUp).unwrap();
    state.play_turn(PlayerAction::Use(1)).unwrap();
    let inventory = state.player().unwrap().inventory.as_ref().unwrap();
    assert!(!inventory.items[0].is_equipped());
    assert!(inventory.items[1].is_equipped());
    assert_eq!(
        inventory.items.iter().filter(|item| item.is_equipped()).count(),
        1
    );

    // Dropping the equipped sword takes it off.
    assert_eq!(state.play_turn(PlayerAction::Drop(1)).unwrap(), ActionResult::Performed);
    let dropped = state.entities.first().unwrap();
    assert_eq!(dropped.position, Some(here));
    assert!(!dropped.is_equipped());
    assert_eq!(state.turn_number, 5);
}

#[test]
fn test_descend_to_next_level() {
    let mut state = new_game();
    state.add_entity(ItemTemplate::healing_potion().spawn(state.player_position().unwrap()));
    state.play_turn(PlayerAction::PickUp).unwrap();

    let stairs = state.grid.stairs_position().unwrap();
    state.player_mut().unwrap().position = Some(stairs);
    let player_id = state.player_id;

    let result = state.play_turn(PlayerAction::Descend).unwrap();

    assert_eq!(result, ActionResult::Performed);
    assert_eq!(state.depth, 2);
    assert_eq!(state.statistics.max_depth_reached, 2);
    assert_eq!(state.player_id, player_id);
    assert_eq!(state.entities.len(), 1);
    assert_eq!(state.player_position(), Some(state.rooms[0].center()));
    assert_eq!(state.player().unwrap().inventory.as_ref().unwrap().len(), 1);
    assert!(state.grid.is_explored(state.rooms[0].center()));
    assert!(!state.field_of_view().is_dirty());
}

#[test]
fn test_descend_without_stairs_is_rejected() {
    let mut state = new_game();
    let off_stairs = state
        .grid
        .floor_positions()
        .into_iter()
        .find(|pos| !state.grid.has_stairs(*pos))
        .unwrap();
    state.player_mut().unwrap().position = Some(off_stairs);

    let result = state.play_turn(PlayerAction::Descend).unwrap();

    assert!(matches!(result, ActionResult::Rejected(_)));
    assert_eq!(state.depth, 1);
    assert_eq!(state.turn_number, 0);
}

#[test]
fn test_quit_ends_session_without_a_turn() {
    let mut state = new_game();
    assert_eq!(state.play_turn(PlayerAction::Quit).unwrap(), ActionResult::Ignored);
    assert_eq!(state.completion_state, GameCompletionState::Quit);
    assert!(state.is_over());
    assert_eq!(state.turn_number, 0);

    let after = state.play_turn(PlayerAction::Move { dx: 1, dy: 0 }).unwrap();
    assert!(matches!(after, ActionResult::Rejected(_)));
}

#[test]
fn test_populated_level_survives_many_turns() {
    let mut state = GameState::new(GameConfig::default(), SEED).unwrap();
    let moves = [(1, 0), (0, 1), (-1, 0), (0, -1), (1, 1), (-1, -1)];

    for step in 0..60 {
        let before = state.turn_number;
        let (dx, dy) = moves[step % moves.len()];
        let result = state.play_turn(PlayerAction::Move { dx, dy }).unwrap();
        if result.is_performed() {
            assert_eq!(state.turn_number, before + 1);
        } else {
            assert_eq!(state.turn_number, before);
        }

        let mut combatant_cells = Vec::new();
        for entity in &state.entities {
            if let Some(pos) = entity.position {
                assert!(!state.grid.is_blocked(pos), "{} stands in a wall", entity.name);
                if entity.combatant.is_some() {
                    assert!(!combatant_cells.contains(&pos), "two combatants at {}", pos);
                    combatant_cells.push(pos);
                }
            }
        }
        if state.is_over() {
            break;
        }
    }
}
