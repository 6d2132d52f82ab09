//! Save and load through real files.

use delve::{
    ActionResult, DelveError, GameCompletionState, GameConfig, GameState, ItemTemplate,
    PlayerAction, TurnPhase,
};
use std::fs;
use tempfile::tempdir;

fn played_game() -> GameState {
    let mut state = GameState::new(GameConfig::default(), 4242).unwrap();
    let here = state.player_position().unwrap();
    state.add_entity(ItemTemplate::wooden_shield().spawn(here));
    state.play_turn(PlayerAction::PickUp).unwrap();
    state.play_turn(PlayerAction::Use(0)).unwrap();
    for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
        state.play_turn(PlayerAction::Move { dx, dy }).unwrap();
    }
    state
}

#[test]
fn test_round_trip_preserves_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    let state = played_game();

    state.save_to_file(&path).unwrap();
    let loaded = GameState::load_from_file(&path).unwrap();

    assert_eq!(loaded.grid, state.grid);
    assert_eq!(loaded.rooms, state.rooms);
    assert_eq!(loaded.entities, state.entities);
    assert_eq!(loaded.player_id, state.player_id);
    assert_eq!(loaded.messages, state.messages);
    assert_eq!(loaded.depth, state.depth);
    assert_eq!(loaded.turn_number, state.turn_number);
    assert_eq!(loaded.statistics, state.statistics);
    assert_eq!(loaded.config, state.config);

    assert_eq!(loaded.phase(), TurnPhase::AwaitingInput);
    assert!(!loaded.field_of_view().is_dirty());
    assert_eq!(loaded.field_of_view().visible(), state.field_of_view().visible());

    let shield = &loaded.player().unwrap().inventory.as_ref().unwrap().items[0];
    assert!(shield.is_equipped());
}

#[test]
fn test_save_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("save.json");
    played_game().save_to_file(&path).unwrap();

    let names: Vec<String> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["save.json".to_string()]);
}

#[test]
fn test_loaded_games_continue_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    played_game().save_to_file(&path).unwrap();

    let mut first = GameState::load_from_file(&path).unwrap();
    let mut second = GameState::load_from_file(&path).unwrap();
    for (dx, dy) in [(1, 1), (-1, 0), (0, -1)] {
        first.play_turn(PlayerAction::Move { dx, dy }).unwrap();
        second.play_turn(PlayerAction::Move { dx, dy }).unwrap();
    }

    assert_eq!(first.save_to_json().unwrap(), second.save_to_json().unwrap());
}

#[test]
fn test_missing_save_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = GameState::load_from_file(&path).unwrap_err();
    assert!(matches!(err, DelveError::SaveNotFound(ref p) if *p == path));
    assert!(err.is_persistence());
}

#[test]
fn test_corrupt_save_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, "{ \"grid\": 12 }").unwrap();

    let err = GameState::load_from_file(&path).unwrap_err();
    assert!(matches!(err, DelveError::CorruptSave { .. }));
    assert!(err.is_persistence());
}

#[test]
fn test_save_without_player_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    let mut state = played_game();
    let player_id = state.player_id;
    state.remove_entity(player_id);
    state.save_to_file(&path).unwrap();

    assert!(matches!(
        GameState::load_from_file(&path),
        Err(DelveError::CorruptSave { .. })
    ));
}

#[test]
fn test_quit_save_resumes_as_playing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    let mut state = GameState::new(GameConfig::unpopulated(), 77).unwrap();
    state.play_turn(PlayerAction::Quit).unwrap();
    assert!(state.is_over());
    state.save_to_file(&path).unwrap();

    let mut loaded = GameState::load_from_file(&path).unwrap();
    assert_eq!(loaded.completion_state, GameCompletionState::Playing);
    assert!(!loaded.is_over());

    let here = loaded.player_position().unwrap();
    let open = loaded
        .grid
        .floor_positions()
        .into_iter()
        .find(|pos| pos.chebyshev_distance(here) == 1)
        .unwrap();
    let result = loaded
        .play_turn(PlayerAction::Move {
            dx: open.x - here.x,
            dy: open.y - here.y,
        })
        .unwrap();
    assert_eq!(result, ActionResult::Performed);
    assert_eq!(loaded.player_position(), Some(open));
}

#[test]
fn test_dead_player_stays_dead_after_load() {
    let mut state = GameState::new(GameConfig::unpopulated(), 78).unwrap();
    let player_id = state.player_id;
    state.take_damage(player_id, 1000);
    assert_eq!(state.completion_state, GameCompletionState::PlayerDied);

    let loaded = GameState::load_from_json(&state.save_to_json().unwrap()).unwrap();
    assert!(loaded.is_over());
}

#[test]
fn test_truncated_grid_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    let mut value: serde_json::Value =
        serde_json::from_str(&played_game().save_to_json().unwrap()).unwrap();
    value["grid"]["tiles"].as_array_mut().unwrap().truncate(10);
    fs::write(&path, value.to_string()).unwrap();

    let err = GameState::load_from_file(&path).unwrap_err();
    assert!(matches!(err, DelveError::CorruptSave { .. }));
    assert!(err.is_persistence());
}
