//! # Game State Module
//!
//! Central game state management and coordination between all game systems.
//!
//! [`GameState`] is the session object. It owns the grid, the ordered room
//! list, the entity list and the message log, and it orchestrates level
//! regeneration. The turn-action resolver is implemented on it in
//! [`crate::game::actions`]; this module covers construction, queries for the
//! renderer, level transitions and persistence.

use crate::config::MAX_MESSAGES;
use crate::{
    generate_with_retry, CellView, DelveError, DelveResult, Dungeon, EncounterGenerator, Entity,
    EntityId, FieldOfView, GameConfig, Generator, Grid, ItemGenerator, Position, Room,
    RoomCorridorGenerator, TurnPhase,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Central game state containing all session data.
///
/// Only the persistent half is serialized. The field of view, the random
/// number generator and the turn phase are rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current level layout
    pub grid: Grid,
    /// Rooms of the current level in generation order
    pub rooms: Vec<Room>,
    /// Entities on the current level, in draw and AI order
    pub entities: Vec<Entity>,
    /// The player entity ID
    pub player_id: EntityId,
    /// Message log, oldest first
    pub messages: Vec<Message>,
    /// Current dungeon depth, starting at 1
    pub depth: u32,
    /// Number of resolved turns
    pub turn_number: u64,
    /// Seed the session was started with
    pub rng_seed: u64,
    /// Current game completion state
    pub completion_state: GameCompletionState,
    /// Game statistics for player progress
    pub statistics: GameStatistics,
    pub config: GameConfig,
    #[serde(skip)]
    pub(crate) fov: FieldOfView,
    #[serde(skip, default = "unseeded_rng")]
    pub(crate) rng: StdRng,
    #[serde(skip)]
    pub(crate) phase: TurnPhase,
}

fn unseeded_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// Game completion state for handling endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    /// Game is still in progress
    Playing,
    /// Player died
    PlayerDied,
    /// Player quit
    Quit,
}

/// Colour class of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Plain status text
    Info,
    /// Attacks and damage
    Combat,
    /// Deaths
    Death,
    /// Pickups, healing and other good news
    Success,
}

/// One line of the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Monsters killed by anyone
    pub enemies_defeated: u32,
    /// Items the player picked up
    pub items_collected: u32,
    /// Damage dealt by the player
    pub damage_dealt: u64,
    /// Damage the player took
    pub damage_taken: u64,
    /// Deepest level reached
    pub max_depth_reached: u32,
    /// Successful player moves
    pub steps_taken: u64,
}

impl GameState {
    /// Starts a new game: generates the first level, places the player in
    /// the first room and populates the level from the spawn tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameConfig, GameState};
    ///
    /// let state = GameState::new(GameConfig::default(), 12345).unwrap();
    /// assert_eq!(state.depth, 1);
    /// let player = state.player().unwrap();
    /// assert_eq!(player.position, Some(state.rooms[0].center()));
    /// ```
    pub fn new(config: GameConfig, seed: u64) -> DelveResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let dungeon =
            generate_with_retry(&RoomCorridorGenerator::new(), &config.generation, &mut rng)?;
        Self::from_parts(config, dungeon, seed, rng)
    }

    /// Starts a game on a prepared level. Used for scripted scenarios.
    pub fn with_dungeon(config: GameConfig, dungeon: Dungeon, seed: u64) -> DelveResult<Self> {
        Self::from_parts(config, dungeon, seed, StdRng::seed_from_u64(seed))
    }

    fn from_parts(
        config: GameConfig,
        dungeon: Dungeon,
        seed: u64,
        mut rng: StdRng,
    ) -> DelveResult<Self> {
        let spawn = dungeon.spawn_point().ok_or_else(|| {
            DelveError::GenerationFailed("Level has no room to start in".to_string())
        })?;
        let player = config.player.spawn(spawn);
        let player_id = player.id;
        let mut entities = Self::populate(&dungeon.grid, &config, &mut rng, &[spawn], 1)?;
        entities.push(player);
        let fov = FieldOfView::new(&dungeon.grid, config.fov);

        let mut state = Self {
            grid: dungeon.grid,
            rooms: dungeon.rooms,
            player_id,
            entities,
            messages: Vec::new(),
            depth: 1,
            turn_number: 0,
            rng_seed: seed,
            completion_state: GameCompletionState::Playing,
            statistics: GameStatistics {
                max_depth_reached: 1,
                ..GameStatistics::default()
            },
            config,
            fov,
            rng,
            phase: TurnPhase::AwaitingInput,
        };
        state.recompute_fov_if_dirty();
        state.message(
            "Welcome, adventurer! Find the stairs and delve deeper.",
            Severity::Info,
        );
        log::info!("Started new game with seed {}", seed);
        Ok(state)
    }

    /// Spawns monsters and floor items on `grid`, keeping clear of
    /// `occupied`.
    ///
    /// The result is items first, then monsters. Callers append whatever was
    /// already on the level (the player), so creatures draw over items and
    /// the player draws over everything.
    fn populate(
        grid: &Grid,
        config: &GameConfig,
        rng: &mut StdRng,
        occupied: &[Position],
        depth: u32,
    ) -> DelveResult<Vec<Entity>> {
        let encounters = EncounterGenerator::new(grid, &config.monsters, config.monsters_per_level)
            .avoiding(occupied.iter().copied());
        let monsters = encounters.generate(&config.generation, rng)?;
        encounters.validate(&monsters, &config.generation)?;

        let item_generator = ItemGenerator::new(grid, &config.items, config.items_per_level)
            .avoiding(
                occupied
                    .iter()
                    .copied()
                    .chain(monsters.iter().filter_map(|m| m.position)),
            );
        let items = item_generator.generate(&config.generation, rng)?;
        item_generator.validate(&items, &config.generation)?;

        log::debug!(
            "Populated depth {} with {} monsters and {} items",
            depth,
            monsters.len(),
            items.len()
        );
        Ok(items.into_iter().chain(monsters).collect())
    }

    /// Replaces the level with a freshly generated and populated one and
    /// moves the player to its first room. Everything except the player is
    /// discarded.
    ///
    /// The new level is built in full before anything is swapped in, so on
    /// failure the current level is left untouched.
    pub fn advance_level(&mut self) -> DelveResult<()> {
        if self.player().is_none() {
            return Err(DelveError::InvalidState("Player is missing".to_string()));
        }
        let dungeon = generate_with_retry(
            &RoomCorridorGenerator::new(),
            &self.config.generation,
            &mut self.rng,
        )?;
        let spawn = dungeon.spawn_point().ok_or_else(|| {
            DelveError::GenerationFailed("Level has no room to start in".to_string())
        })?;
        let population = Self::populate(
            &dungeon.grid,
            &self.config,
            &mut self.rng,
            &[spawn],
            self.depth + 1,
        )?;

        let mut player = self
            .remove_entity(self.player_id)
            .ok_or_else(|| DelveError::InvalidState("Player is missing".to_string()))?;
        player.position = Some(spawn);

        self.grid = dungeon.grid;
        self.rooms = dungeon.rooms;
        self.entities = population;
        self.entities.push(player);
        self.depth += 1;
        self.statistics.max_depth_reached = self.statistics.max_depth_reached.max(self.depth);

        self.fov.rebuild(&self.grid);
        self.recompute_fov_if_dirty();

        self.message(
            "You take a moment to rest, then descend deeper into the dungeon.",
            Severity::Info,
        );
        log::info!("Descended to depth {}", self.depth);
        Ok(())
    }

    /// Gets an entity by ID.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Gets a mutable entity by ID.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Adds an entity to the end of the list and returns its ID.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// Removes an entity from the list.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entity(self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player_id;
        self.entity_mut(id)
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player().and_then(|p| p.position)
    }

    /// First entity at `pos`, other than `exclude`, that satisfies
    /// `predicate`.
    pub fn entity_at<P>(&self, pos: Position, exclude: Option<EntityId>, predicate: P) -> Option<&Entity>
    where
        P: Fn(&Entity) -> bool,
    {
        self.entities
            .iter()
            .find(|e| e.is_at(pos) && Some(e.id) != exclude && predicate(e))
    }

    /// Appends to the message log, dropping the oldest lines past the cap.
    pub fn message(&mut self, text: impl Into<String>, severity: Severity) {
        self.messages.push(Message {
            text: text.into(),
            severity,
        });
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
    }

    /// The last `count` messages, oldest first.
    pub fn recent_messages(&self, count: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Session RNG. Cloning it predicts the next rolls.
    pub fn rng(&self) -> &StdRng {
        &self.rng
    }

    pub fn field_of_view(&self) -> &FieldOfView {
        &self.fov
    }

    /// Recomputes the field of view from the player if it is stale.
    pub fn recompute_fov_if_dirty(&mut self) -> bool {
        match self.player_position() {
            Some(origin) => self.fov.recompute_if_dirty(&mut self.grid, origin),
            None => false,
        }
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.fov.is_visible(pos)
    }

    /// Presentation state of a cell for the renderer.
    pub fn cell_view(&self, pos: Position) -> CellView {
        self.fov.cell_view(&self.grid, pos)
    }

    /// Entities standing in the player's field of view, in draw order.
    pub fn visible_entities(&self) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.position.map_or(false, |pos| self.fov.is_visible(pos)))
            .collect()
    }

    /// Saves game state to JSON.
    pub fn save_to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }

    /// Loads game state from JSON and rebuilds the transient state.
    pub fn load_from_json(json: &str) -> DelveResult<Self> {
        let mut state: GameState = serde_json::from_str(json)?;
        state.restore_transient()?;
        Ok(state)
    }

    fn restore_transient(&mut self) -> DelveResult<()> {
        if self.player().is_none() {
            return Err(DelveError::InvalidState(format!(
                "Player {} is not among the saved entities",
                self.player_id
            )));
        }
        // A quit session resumes; only a death is final.
        if self.completion_state == GameCompletionState::Quit {
            self.completion_state = GameCompletionState::Playing;
        }
        self.fov = FieldOfView::new(&self.grid, self.config.fov);
        self.rng = StdRng::seed_from_u64(self.rng_seed.wrapping_add(self.turn_number));
        self.phase = TurnPhase::AwaitingInput;
        self.recompute_fov_if_dirty();
        Ok(())
    }

    /// Writes the save file through a temporary sibling file, so an
    /// interrupted write never leaves a truncated save behind.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        let path = path.as_ref();
        let json = self.save_to_json()?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let base = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("save.json");
        let tmp_path = dir.join(format!(".{}.tmp-{}", base, std::process::id()));

        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(json.as_bytes())?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, path)?;

        log::info!("Saved game to {}", path.display());
        Ok(())
    }

    /// Loads a save file. A missing file is `SaveNotFound`; anything that
    /// cannot be restored is `CorruptSave`.
    pub fn load_from_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DelveError::SaveNotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        let state = Self::load_from_json(&json).map_err(|e| DelveError::CorruptSave {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::info!("Loaded game from {}", path.display());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Capability;
    use tempfile::tempdir;

    #[test]
    fn test_game_state_creation() {
        let state = GameState::new(GameConfig::default(), 12345).unwrap();

        assert_eq!(state.depth, 1);
        assert_eq!(state.turn_number, 0);
        assert_eq!(state.completion_state, GameCompletionState::Playing);
        assert_eq!(state.phase(), TurnPhase::AwaitingInput);

        let player = state.player().unwrap();
        assert_eq!(state.entities.last().map(|e| e.id), Some(player.id));
        assert!(player.has(Capability::Inventory));
        assert_eq!(player.display_name(), "Player the adventurer");
    }

    #[test]
    fn test_new_game_is_deterministic() {
        let a = GameState::new(GameConfig::default(), 99).unwrap();
        let b = GameState::new(GameConfig::default(), 99).unwrap();

        assert_eq!(a.grid, b.grid);
        assert_eq!(a.rooms, b.rooms);
        let positions = |s: &GameState| s.entities.iter().map(|e| e.position).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_population_matches_config() {
        let state = GameState::new(GameConfig::default(), 7).unwrap();
        let monsters = state.entities.iter().filter(|e| e.ai.is_some()).count();
        let items = state.entities.iter().filter(|e| e.item.is_some()).count();
        assert_eq!(monsters, 2);
        assert_eq!(items, 2);

        let player_pos = state.player_position().unwrap();
        assert!(state
            .entity_at(player_pos, Some(state.player_id), |_| true)
            .is_none());
    }

    #[test]
    fn test_initial_fov_is_computed() {
        let state = GameState::new(GameConfig::unpopulated(), 5).unwrap();
        let pos = state.player_position().unwrap();

        assert!(!state.field_of_view().is_dirty());
        assert!(state.is_visible(pos));
        assert_eq!(state.cell_view(pos), CellView::Visible);
        assert!(state.grid.is_explored(pos));
        assert!(state.visible_entities().iter().any(|e| e.id == state.player_id));
    }

    #[test]
    fn test_entity_at_with_exclusion_and_predicate() {
        let mut state = GameState::new(GameConfig::unpopulated(), 5).unwrap();
        let pos = state.player_position().unwrap();
        let potion = crate::ItemTemplate::healing_potion().spawn(pos);
        let potion_id = state.add_entity(potion);

        assert_eq!(state.entity_at(pos, None, |_| true).map(|e| e.id), Some(state.player_id));
        assert_eq!(
            state.entity_at(pos, Some(state.player_id), |_| true).map(|e| e.id),
            Some(potion_id)
        );
        assert!(state
            .entity_at(pos, None, |e| e.has(Capability::Equipment))
            .is_none());
    }

    #[test]
    fn test_message_log_is_capped() {
        let mut state = GameState::new(GameConfig::unpopulated(), 5).unwrap();
        for i in 0..(MAX_MESSAGES + 10) {
            state.message(format!("line {}", i), Severity::Info);
        }
        assert_eq!(state.messages.len(), MAX_MESSAGES);
        assert_eq!(state.recent_messages(1)[0].text, format!("line {}", MAX_MESSAGES + 9));
        assert_eq!(state.recent_messages(500).len(), MAX_MESSAGES);
    }

    #[test]
    fn test_advance_level_keeps_only_the_player() {
        let mut state = GameState::new(GameConfig::default(), 31).unwrap();
        let player_id = state.player_id;

        state.advance_level().unwrap();

        assert_eq!(state.depth, 2);
        assert_eq!(state.statistics.max_depth_reached, 2);
        assert_eq!(state.player_id, player_id);
        assert_eq!(state.player_position(), Some(state.rooms[0].center()));
        assert_eq!(state.entities.last().map(|e| e.id), Some(player_id));
        assert_eq!(state.entities.len(), 1 + 2 + 2);
        assert!(!state.field_of_view().is_dirty());
    }

    #[test]
    fn test_save_and_load_json() {
        let state = GameState::new(GameConfig::default(), 12345).unwrap();
        let json = state.save_to_json().unwrap();

        // Should be valid JSON
        let _: serde_json::Value = serde_json::from_str(&json).unwrap();

        let loaded = GameState::load_from_json(&json).unwrap();
        assert_eq!(loaded.grid, state.grid);
        assert_eq!(loaded.entities, state.entities);
        assert_eq!(loaded.player_id, state.player_id);
        assert_eq!(loaded.messages, state.messages);
        assert_eq!(loaded.field_of_view().visible(), state.field_of_view().visible());
    }

    #[test]
    fn test_load_rejects_missing_player() {
        let mut state = GameState::new(GameConfig::unpopulated(), 1).unwrap();
        state.player_id = crate::new_entity_id();
        let json = state.save_to_json().unwrap();
        assert!(matches!(
            GameState::load_from_json(&json),
            Err(DelveError::InvalidState(_))
        ));
    }

    #[test]
    fn test_save_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saves").join("game.json");
        let state = GameState::new(GameConfig::default(), 4).unwrap();

        state.save_to_file(&path).unwrap();
        let loaded = GameState::load_from_file(&path).unwrap();
        assert_eq!(loaded.entities, state.entities);

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_load_file_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = GameState::load_from_file(&missing).unwrap_err();
        assert!(matches!(err, DelveError::SaveNotFound(_)));
        assert!(err.is_persistence());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ \"grid\": 12").unwrap();
        let err = GameState::load_from_file(&corrupt).unwrap_err();
        assert!(matches!(err, DelveError::CorruptSave { .. }));
        assert!(err.is_persistence());
    }
}
