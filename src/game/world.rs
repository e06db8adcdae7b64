//! The game world: one occupancy grid, one countdown clock, and the monsters
//! living on it. All movement arbitration goes through `enter_cell`; whoever
//! wins a cell's slot owns that cell until it exits. The world publishes a
//! fresh snapshot through the notifier after every observable change.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};
use rand::seq::IteratorRandom;
use tokio::sync::watch;

use crate::config::game::KILL_TIME_PER_MONSTER;
use crate::game::clock::GameClock;
use crate::game::entities::Monster;
use crate::game::grid::CellGrid;
use crate::game::notifier::ChangeNotifier;
use crate::game::types::{CellIcon, Coordinate, Difficulty, GameMode, Grade, WorldSnapshot};
use crate::game::utils::lock;

pub struct World {
    grid: CellGrid,
    clock: GameClock,
    difficulty: Mutex<Difficulty>,
    monster_count: AtomicUsize,
    ready: watch::Sender<bool>,
    notifier: Arc<ChangeNotifier>,
}

impl World {
    /// Builds a world with an empty `width` x `height` grid. Negative
    /// dimensions collapse to zero, same as the grid itself.
    pub fn new(
        width: i32,
        height: i32,
        difficulty: Difficulty,
        notifier: Arc<ChangeNotifier>,
    ) -> Arc<Self> {
        let grid = CellGrid::new(width, height);
        info!(
            "[World] configured {}x{} grid, difficulty {:?}",
            grid.width(),
            grid.height(),
            difficulty
        );
        let (ready, _) = watch::channel(false);
        Arc::new(Self {
            grid,
            clock: GameClock::new(),
            difficulty: Mutex::new(difficulty),
            monster_count: AtomicUsize::new(0),
            ready,
            notifier,
        })
    }

    /// Tries to claim the monster's candidate cell. Border cells and dead
    /// monsters are turned away before the slot is even tried; a cell someone
    /// else holds (or is fighting for right now) refuses entry. Never blocks.
    pub fn enter_cell(&self, monster: &Arc<Monster>) -> bool {
        let target = monster.candidate();
        if self.grid.is_beyond_border(target.x, target.y) {
            return false;
        }
        if monster.is_dead() {
            return false;
        }
        let entered = self.grid.try_occupy(target, monster);
        if entered {
            debug!("[World] monster {} entered {:?}", monster.id(), target);
            self.publish_change();
        }
        entered
    }

    /// Releases the cell the monster currently stands on. False when it holds
    /// no cell (detached, already evicted, or someone else owns the slot).
    /// Clearing the last occupied cell ends the game.
    pub fn exit_cell(&self, monster: &Arc<Monster>) -> bool {
        let current = monster.position();
        if self.grid.is_beyond_border(current.x, current.y) {
            return false;
        }
        let exited = self.grid.vacate(current, monster);
        if exited {
            debug!("[World] monster {} exited {:?}", monster.id(), current);
            if self.grid.is_empty() {
                info!("[World] grid cleared, game over");
                self.clock.stop();
            }
            self.publish_change();
        }
        exited
    }

    pub fn is_beyond_border(&self, x: i32, y: i32) -> bool {
        self.grid.is_beyond_border(x, y)
    }

    /// Puts a new monster on the grid. A monster that arrives with an
    /// in-bounds position gets exactly one try at that cell; otherwise (and
    /// when that cell is taken) it lands on a uniformly chosen free cell.
    /// Fails only when no free cell is left.
    pub fn add_monster(&self, monster: &Arc<Monster>) -> bool {
        let assigned = monster.position();
        if !self.grid.is_beyond_border(assigned.x, assigned.y)
            && self.grid.try_occupy(assigned, monster)
        {
            self.settle(monster, assigned);
            return true;
        }

        let mut rng = rand::rng();
        loop {
            let Some(cell) = self.grid.free_cells().into_iter().choose(&mut rng) else {
                warn!(
                    "[World] no free cell left for monster {}, dropping it",
                    monster.id()
                );
                return false;
            };
            // Another placement may win this cell first; sample again if so.
            if self.grid.try_occupy(cell, monster) {
                self.settle(monster, cell);
                return true;
            }
        }
    }

    fn settle(&self, monster: &Arc<Monster>, cell: Coordinate) {
        monster.set_location(cell);
        self.monster_count.fetch_add(1, Ordering::SeqCst);
        debug!("[World] monster {} placed at {:?}", monster.id(), cell);
        self.publish_change();
    }

    /// Tap handler. Only a vulnerable occupant dies; its cell is freed and,
    /// if the grid emptied, the game ends. Every tap refreshes subscribers,
    /// hit or miss.
    pub fn touch_cell(&self, x: i32, y: i32) -> bool {
        let tapped = self.try_kill_at(x, y);
        self.publish_change();
        tapped
    }

    fn try_kill_at(&self, x: i32, y: i32) -> bool {
        if self.grid.is_beyond_border(x, y) {
            return false;
        }
        let Some(occupant) = self.grid.occupant(Coordinate::new(x, y)) else {
            return false;
        };
        if !occupant.kill() {
            return false;
        }
        self.exit_cell(&occupant);
        true
    }

    /// Starts the game: the time budget is five seconds per monster, every
    /// occupant's engine task is dispatched, and only then does the start
    /// gate open so nobody moves while others are still launching.
    pub fn start_game(self: &Arc<Self>) {
        if self.clock.mode() != GameMode::Paused {
            warn!("[World] start_game ignored, mode is {:?}", self.clock.mode());
            return;
        }
        let count = self.monster_count.load(Ordering::SeqCst) as u32;
        self.clock.set_time(count * KILL_TIME_PER_MONSTER);

        let occupants = self.grid.occupants();
        for occupant in &occupants {
            occupant.launch(self.ready.subscribe());
        }
        self.ready.send_replace(true);

        let world = Arc::downgrade(self);
        self.clock.start(move || {
            if let Some(world) = world.upgrade() {
                world.publish_change();
            }
        });
        info!(
            "[World] game started: {} monsters, {}s on the clock",
            occupants.len(),
            count * KILL_TIME_PER_MONSTER
        );
        self.publish_change();
    }

    /// Ends the game: every occupant dies where it stands (safe or not) and
    /// the clock freezes. Idempotent.
    pub fn stop_game(&self) {
        for occupant in self.grid.occupants() {
            occupant.shutdown();
        }
        self.clock.stop();
        info!("[World] game stopped");
        self.publish_change();
    }

    pub fn is_game_over(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    pub fn occupant(&self, x: i32, y: i32) -> Option<Arc<Monster>> {
        self.grid.occupant(Coordinate::new(x, y))
    }

    pub fn icon_at(&self, x: i32, y: i32) -> CellIcon {
        self.grid.icon_at(Coordinate::new(x, y))
    }

    pub fn monster_count(&self) -> usize {
        self.monster_count.load(Ordering::SeqCst)
    }

    pub fn difficulty(&self) -> Difficulty {
        *lock(&self.difficulty)
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        *lock(&self.difficulty) = difficulty;
    }

    pub fn time_remaining(&self) -> u32 {
        self.clock.time_remaining()
    }

    pub fn max_time(&self) -> u32 {
        self.clock.max_time()
    }

    pub fn score(&self) -> Grade {
        self.clock.score()
    }

    pub fn mode(&self) -> GameMode {
        self.clock.mode()
    }

    /// Manual one-second decrement on the countdown, for callers that meter
    /// time themselves. Returns the new remaining time.
    pub fn decrement_time(&self) -> u32 {
        let remaining = self.clock.decrement_time();
        self.publish_change();
        remaining
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let cells = (0..self.grid.height())
            .map(|y| {
                (0..self.grid.width())
                    .map(|x| self.grid.icon_at(Coordinate::new(x, y)))
                    .collect()
            })
            .collect();
        let alive = self
            .grid
            .occupants()
            .iter()
            .filter(|monster| !monster.is_dead())
            .count();
        WorldSnapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            cells,
            mode: self.clock.mode(),
            time_remaining: self.clock.time_remaining(),
            score: self.clock.score(),
            monsters_alive: alive,
        }
    }

    pub fn publish_change(&self) {
        self.notifier.publish(self.snapshot());
    }
}

impl Drop for World {
    fn drop(&mut self) {
        for occupant in self.grid.occupants() {
            occupant.shutdown();
        }
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::MonsterBehavior;
    use crate::game::types::MonsterState;

    fn world(width: i32, height: i32) -> Arc<World> {
        World::new(
            width,
            height,
            Difficulty::Normal,
            Arc::new(ChangeNotifier::new()),
        )
    }

    fn monster_at(world: &Arc<World>, x: i32, y: i32) -> Arc<Monster> {
        let monster = Monster::new(Arc::downgrade(world), MonsterBehavior::manual());
        monster.set_location(Coordinate::new(x, y));
        assert!(world.add_monster(&monster));
        monster
    }

    #[test]
    fn test_add_monster_honors_a_free_assigned_cell() {
        let world = world(5, 6);
        let monster = monster_at(&world, 1, 1);

        assert_eq!(monster.position(), Coordinate::new(1, 1));
        assert_eq!(
            world.occupant(1, 1).map(|o| o.id()),
            Some(monster.id())
        );
        assert_eq!(world.monster_count(), 1);
    }

    #[test]
    fn test_add_monster_falls_back_to_a_random_free_cell() {
        let world = world(2, 1);
        let first = monster_at(&world, 0, 0);

        let second = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());
        second.set_location(Coordinate::new(0, 0));
        assert!(world.add_monster(&second));

        // Only (1, 0) was open.
        assert_eq!(second.position(), Coordinate::new(1, 0));
        assert_ne!(second.position(), first.position());
    }

    #[test]
    fn test_add_monster_fails_on_a_full_grid() {
        let world = world(1, 1);
        monster_at(&world, 0, 0);

        let extra = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());
        assert!(!world.add_monster(&extra));
        assert_eq!(world.monster_count(), 1);
    }

    #[test]
    fn test_detached_monsters_land_on_distinct_cells() {
        let world = world(2, 2);
        for _ in 0..4 {
            let monster = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());
            assert!(world.add_monster(&monster));
        }
        assert!(world.snapshot().cells.iter().flatten().all(|icon| *icon != CellIcon::Blank));
    }

    #[test]
    fn test_enter_rejects_border_candidates() {
        let world = world(5, 6);
        let monster = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());

        for bad in [
            Coordinate::DETACHED,
            Coordinate::new(0, -1),
            Coordinate::new(5, 0),
            Coordinate::new(0, 6),
        ] {
            monster.set_location(bad);
            assert!(!world.enter_cell(&monster));
        }
        assert!(world.is_game_over());
    }

    #[test]
    fn test_enter_rejects_dead_monsters() {
        let world = world(3, 3);
        let monster = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());
        monster.set_state(MonsterState::Vulnerable);
        monster.kill();

        monster.set_location(Coordinate::new(1, 1));
        assert!(!world.enter_cell(&monster));
        assert!(world.occupant(1, 1).is_none());
    }

    #[test]
    fn test_exit_requires_actual_occupancy() {
        let world = world(3, 3);
        let never_entered = Monster::new(Arc::downgrade(&world), MonsterBehavior::manual());
        assert!(!world.exit_cell(&never_entered));

        never_entered.set_location(Coordinate::new(2, 2));
        assert!(!world.exit_cell(&never_entered));
    }

    #[test]
    fn test_touching_a_safe_monster_changes_nothing() {
        let world = world(5, 6);
        let monster = monster_at(&world, 2, 3);
        monster.set_state(MonsterState::Safe);

        assert!(!world.touch_cell(2, 3));
        assert!(!monster.is_dead());
        assert_eq!(world.occupant(2, 3).map(|o| o.id()), Some(monster.id()));
        assert!(!world.is_game_over());
    }

    #[test]
    fn test_touching_a_vulnerable_monster_kills_and_evicts_it() {
        let world = world(5, 6);
        let monster = monster_at(&world, 2, 3);
        monster.set_state(MonsterState::Vulnerable);

        assert!(world.touch_cell(2, 3));
        assert!(monster.is_dead());
        assert!(world.occupant(2, 3).is_none());
        assert!(world.is_game_over());
        assert_eq!(world.mode(), GameMode::Stopped);
    }

    #[test]
    fn test_touching_empty_or_border_cells_misses() {
        let world = world(5, 6);
        monster_at(&world, 0, 0);

        assert!(!world.touch_cell(3, 3));
        assert!(!world.touch_cell(-1, 0));
        assert!(!world.touch_cell(5, 6));
    }

    #[test]
    fn test_icons_track_occupancy_and_state() {
        let world = world(2, 2);
        let monster = monster_at(&world, 0, 1);

        monster.set_state(MonsterState::Safe);
        assert_eq!(world.icon_at(0, 1), CellIcon::Safe);
        monster.set_state(MonsterState::Vulnerable);
        assert_eq!(world.icon_at(0, 1), CellIcon::Vulnerable);
        assert_eq!(world.icon_at(1, 0), CellIcon::Blank);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_game_budgets_five_seconds_per_monster() {
        let world = world(5, 6);
        monster_at(&world, 0, 0);
        monster_at(&world, 1, 0);
        monster_at(&world, 2, 0);

        world.start_game();
        assert_eq!(world.mode(), GameMode::Running);
        assert_eq!(world.time_remaining(), 15);
        assert_eq!(world.max_time(), 15);

        // A second start must not reset the clock.
        world.decrement_time();
        world.start_game();
        assert_eq!(world.time_remaining(), 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_game_kills_everyone_in_place() {
        let world = world(5, 6);
        let safe = monster_at(&world, 0, 0);
        safe.set_state(MonsterState::Safe);
        let vulnerable = monster_at(&world, 1, 1);
        vulnerable.set_state(MonsterState::Vulnerable);

        world.start_game();
        world.stop_game();

        assert_eq!(world.mode(), GameMode::Stopped);
        assert!(safe.is_dead());
        assert!(vulnerable.is_dead());
        // Corpses keep their cells; the grid did not empty.
        assert!(world.occupant(0, 0).is_some());
        assert!(!world.is_game_over());

        world.stop_game();
        assert_eq!(world.mode(), GameMode::Stopped);
    }

    #[test]
    fn test_snapshot_reports_the_whole_picture() {
        let world = world(3, 2);
        let monster = monster_at(&world, 2, 1);
        monster.set_state(MonsterState::Vulnerable);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.width, 3);
        assert_eq!(snapshot.height, 2);
        assert_eq!(snapshot.cells.len(), 2);
        assert_eq!(snapshot.cells[0].len(), 3);
        assert_eq!(snapshot.cells[1][2], CellIcon::Vulnerable);
        assert_eq!(snapshot.monsters_alive, 1);
        assert_eq!(snapshot.mode, GameMode::Paused);
    }

    #[test]
    fn test_worlds_without_monsters_report_game_over() {
        let world = world(4, 4);
        assert!(world.is_game_over());
    }
}
