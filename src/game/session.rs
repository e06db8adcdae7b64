//! Session facade for renderers and controllers.
//!
//! A session outlives any single game: `configure` builds a world, `reset`
//! tears it down, and the notifier (and every subscriber on it) carries over
//! to the next round. Commands against an unconfigured session log a warning
//! and answer with the failure value instead of panicking.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use tokio::sync::watch;

use crate::game::entities::{Monster, MonsterBehavior};
use crate::game::notifier::ChangeNotifier;
use crate::game::types::{CellIcon, Coordinate, Difficulty, GameMode, Grade, WorldSnapshot};
use crate::game::utils::lock;
use crate::game::world::World;

pub struct GameSession {
    world: Mutex<Option<Arc<World>>>,
    difficulty: Mutex<Difficulty>,
    notifier: Arc<ChangeNotifier>,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            world: Mutex::new(None),
            difficulty: Mutex::new(Difficulty::Normal),
            notifier: Arc::new(ChangeNotifier::new()),
        }
    }

    /// One-time world construction. Refused while a world already exists;
    /// call `reset` first to start over.
    pub fn configure(&self, width: i32, height: i32) -> bool {
        let mut world = lock(&self.world);
        if world.is_some() {
            warn!("[GameSession] configure refused, session already has a world");
            return false;
        }
        *world = Some(World::new(
            width,
            height,
            *lock(&self.difficulty),
            Arc::clone(&self.notifier),
        ));
        true
    }

    /// Stops and drops the current world, if any. Subscribers stay attached
    /// and immediately see a blank snapshot.
    pub fn reset(&self) {
        if let Some(world) = lock(&self.world).take() {
            world.stop_game();
            info!("[GameSession] session reset");
        }
        self.notifier.publish(WorldSnapshot::default());
    }

    pub fn is_configured(&self) -> bool {
        lock(&self.world).is_some()
    }

    fn world(&self) -> Option<Arc<World>> {
        lock(&self.world).clone()
    }

    fn world_or_warn(&self, command: &str) -> Option<Arc<World>> {
        let world = self.world();
        if world.is_none() {
            warn!("[GameSession] {} ignored, configure a world first", command);
        }
        world
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        *lock(&self.difficulty) = difficulty;
        if let Some(world) = self.world() {
            world.set_difficulty(difficulty);
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        *lock(&self.difficulty)
    }

    /// Creates a monster with production behavior and places it, at `at` when
    /// given (and free), on a random free cell otherwise.
    pub fn spawn_monster(&self, at: Option<Coordinate>) -> Option<Arc<Monster>> {
        self.spawn_monster_with(at, MonsterBehavior::default())
    }

    /// Same as `spawn_monster` but with caller-supplied behavior, the hook
    /// for scripted direction pickers and hand-driven monsters.
    pub fn spawn_monster_with(
        &self,
        at: Option<Coordinate>,
        behavior: MonsterBehavior,
    ) -> Option<Arc<Monster>> {
        let world = self.world_or_warn("spawn_monster")?;
        let monster = Monster::new(Arc::downgrade(&world), behavior);
        if let Some(coord) = at {
            monster.set_location(coord);
        }
        world.add_monster(&monster).then_some(monster)
    }

    /// Spawns up to `count` monsters on random free cells; returns how many
    /// actually fit.
    pub fn generate_monsters(&self, count: usize) -> usize {
        (0..count)
            .filter(|_| self.spawn_monster(None).is_some())
            .count()
    }

    pub fn start_game(&self) -> bool {
        match self.world_or_warn("start_game") {
            Some(world) => {
                world.start_game();
                true
            }
            None => false,
        }
    }

    pub fn stop_game(&self) -> bool {
        match self.world_or_warn("stop_game") {
            Some(world) => {
                world.stop_game();
                true
            }
            None => false,
        }
    }

    pub fn touch_cell(&self, x: i32, y: i32) -> bool {
        match self.world_or_warn("touch_cell") {
            Some(world) => world.touch_cell(x, y),
            None => false,
        }
    }

    /// Re-publishes the current snapshot without changing anything, for
    /// listeners that want a frame on demand.
    pub fn refresh(&self) {
        match self.world() {
            Some(world) => world.publish_change(),
            None => self.notifier.publish(WorldSnapshot::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WorldSnapshot> {
        self.notifier.subscribe()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world()
            .map(|world| world.snapshot())
            .unwrap_or_default()
    }

    pub fn dimensions(&self) -> (i32, i32) {
        self.world()
            .map(|world| (world.width(), world.height()))
            .unwrap_or((0, 0))
    }

    pub fn icon_at(&self, x: i32, y: i32) -> CellIcon {
        self.world()
            .map(|world| world.icon_at(x, y))
            .unwrap_or(CellIcon::Blank)
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        self.world()
            .is_some_and(|world| world.occupant(x, y).is_some())
    }

    pub fn mode(&self) -> GameMode {
        self.world()
            .map(|world| world.mode())
            .unwrap_or(GameMode::Paused)
    }

    pub fn time_remaining(&self) -> u32 {
        self.world().map(|world| world.time_remaining()).unwrap_or(0)
    }

    pub fn score(&self) -> Grade {
        self.world().map(|world| world.score()).unwrap_or(Grade::F)
    }

    pub fn is_game_over(&self) -> bool {
        self.world().is_some_and(|world| world.is_game_over())
    }

    pub fn monster_count(&self) -> usize {
        self.world().map(|world| world.monster_count()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_is_one_shot_until_reset() {
        let session = GameSession::new();
        assert!(!session.is_configured());

        assert!(session.configure(5, 6));
        assert!(session.is_configured());
        assert_eq!(session.dimensions(), (5, 6));

        assert!(!session.configure(3, 3));
        assert_eq!(session.dimensions(), (5, 6));

        session.reset();
        assert!(!session.is_configured());
        assert!(session.configure(3, 3));
        assert_eq!(session.dimensions(), (3, 3));
    }

    #[test]
    fn test_unconfigured_commands_answer_with_failure_values() {
        let session = GameSession::new();

        assert!(session.spawn_monster(None).is_none());
        assert_eq!(session.generate_monsters(3), 0);
        assert!(!session.start_game());
        assert!(!session.stop_game());
        assert!(!session.touch_cell(0, 0));
        assert_eq!(session.time_remaining(), 0);
        assert_eq!(session.score(), Grade::F);
        assert_eq!(session.mode(), GameMode::Paused);
        assert_eq!(session.icon_at(0, 0), CellIcon::Blank);
        assert!(!session.is_occupied(0, 0));
        assert!(!session.is_game_over());
    }

    #[test]
    fn test_spawning_fills_the_board_or_reports_short() {
        let session = GameSession::new();
        session.configure(2, 2);

        let pinned = session.spawn_monster(Some(Coordinate::new(1, 1)));
        assert_eq!(pinned.map(|m| m.position()), Some(Coordinate::new(1, 1)));

        // Three free cells remain, so only three of five fit.
        assert_eq!(session.generate_monsters(5), 3);
        assert_eq!(session.monster_count(), 4);
        assert!(session.spawn_monster(None).is_none());
    }

    #[test]
    fn test_difficulty_is_cached_for_the_next_world_too() {
        let session = GameSession::new();
        session.set_difficulty(Difficulty::Hard);
        session.configure(4, 4);
        assert_eq!(session.difficulty(), Difficulty::Hard);

        session.reset();
        session.set_difficulty(Difficulty::Normal);
        session.configure(4, 4);
        assert_eq!(session.difficulty(), Difficulty::Normal);
    }

    #[test]
    fn test_subscribers_survive_a_reset() {
        let session = GameSession::new();
        let mut receiver = session.subscribe();

        session.configure(3, 3);
        session.spawn_monster(Some(Coordinate::new(0, 0)));
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().width, 3);

        session.reset();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().width, 0);

        session.configure(4, 4);
        session.refresh();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().width, 4);
    }
}
