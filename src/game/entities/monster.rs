//! The monster actor.
//!
//! A monster owns no thread of its own; two `RandomIntervalEngine`s drive it,
//! one calling `attempt_move` and one calling `toggle_state`. Everything else
//! here is shared state guarded by short mutex sections, because moves, state
//! flips and taps land concurrently from different tasks.

use std::ops::Range;
use std::sync::{Arc, Mutex, Weak};

use log::debug;
use rand::Rng;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::game::{MOVE_INTERVAL_MS, STATE_INTERVAL_MS};
use crate::game::engine::RandomIntervalEngine;
use crate::game::types::{Coordinate, Difficulty, Direction, MonsterState};
use crate::game::utils::lock;
use crate::game::world::World;

/// How a monster behaves: where it wants to go and how often it acts.
/// Production uses `default()`; tests inject scripted pickers or run with
/// `auto_engines` off and drive the monster by hand.
pub struct MonsterBehavior {
    pub pick_direction: Box<dyn Fn() -> Direction + Send + Sync>,
    pub move_interval_ms: Range<u64>,
    pub state_interval_ms: Range<u64>,
    pub auto_engines: bool,
}

impl Default for MonsterBehavior {
    fn default() -> Self {
        Self {
            pick_direction: Box::new(random_direction),
            move_interval_ms: MOVE_INTERVAL_MS,
            state_interval_ms: STATE_INTERVAL_MS,
            auto_engines: true,
        }
    }
}

impl MonsterBehavior {
    /// No engines are ever scheduled; the caller drives the monster directly.
    pub fn manual() -> Self {
        Self {
            auto_engines: false,
            ..Self::default()
        }
    }

    /// Manual monster with a scripted direction picker.
    pub fn scripted<F>(pick: F) -> Self
    where
        F: Fn() -> Direction + Send + Sync + 'static,
    {
        Self {
            pick_direction: Box::new(pick),
            auto_engines: false,
            ..Self::default()
        }
    }
}

fn random_direction() -> Direction {
    Direction::COMPASS[rand::rng().random_range(0..Direction::COMPASS.len())]
}

struct Vitals {
    state: MonsterState,
    toggle_count: u32,
    dead: bool,
}

struct MonsterEngines {
    movement: RandomIntervalEngine,
    state: RandomIntervalEngine,
}

pub struct Monster {
    id: Uuid,
    vitals: Mutex<Vitals>,
    pos: Mutex<Coordinate>,
    candidate: Mutex<Coordinate>,
    engines: Mutex<Option<MonsterEngines>>,
    world: Weak<World>,
    // Handle back to the owning Arc, for tasks that must keep `self` alive.
    me: Weak<Monster>,
    behavior: MonsterBehavior,
}

impl Monster {
    pub fn new(world: Weak<World>, behavior: MonsterBehavior) -> Arc<Self> {
        let state = if rand::rng().random_bool(0.5) {
            MonsterState::Safe
        } else {
            MonsterState::Vulnerable
        };
        Arc::new_cyclic(|me| Self {
            id: Uuid::new_v4(),
            vitals: Mutex::new(Vitals {
                state,
                // Seeded so the very first hard-difficulty flip goes through.
                toggle_count: 4,
                dead: false,
            }),
            pos: Mutex::new(Coordinate::DETACHED),
            candidate: Mutex::new(Coordinate::DETACHED),
            engines: Mutex::new(None),
            world,
            me: me.clone(),
            behavior,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn position(&self) -> Coordinate {
        *lock(&self.pos)
    }

    pub fn candidate(&self) -> Coordinate {
        *lock(&self.candidate)
    }

    pub fn state(&self) -> MonsterState {
        lock(&self.vitals).state
    }

    pub fn is_dead(&self) -> bool {
        lock(&self.vitals).dead
    }

    pub fn set_state(&self, state: MonsterState) {
        lock(&self.vitals).state = state;
    }

    /// Places the monster at `coord` without touching the grid. Position and
    /// candidate move together so a later border check sees the same cell.
    pub fn set_location(&self, coord: Coordinate) {
        *lock(&self.pos) = coord;
        *lock(&self.candidate) = coord;
    }

    /// The cell one step away in `direction` from the current position.
    /// Pure arithmetic; only `NoMove` yields the current cell back.
    pub fn move_to(&self, direction: Direction) -> Coordinate {
        self.position().step(direction)
    }

    /// One movement round: keep picking a direction and asking the world for
    /// the candidate cell until an entry succeeds, yielding between attempts.
    /// Once the new cell is won the old one is released and the move commits.
    /// A monster killed along the way abandons the round and never remains an
    /// occupant afterwards.
    pub async fn attempt_move(&self) {
        let Some(world) = self.world.upgrade() else {
            return;
        };
        let Some(this) = self.me.upgrade() else {
            return;
        };
        loop {
            if self.is_dead() {
                return;
            }
            let direction = (self.behavior.pick_direction)();
            let target = self.move_to(direction);
            *lock(&self.candidate) = target;

            if world.enter_cell(&this) {
                let current = self.position();
                if target != current {
                    world.exit_cell(&this);
                }
                *lock(&self.pos) = target;
                // A tap may have landed between winning the slot and this
                // commit; the eviction it performed saw the old cell, so the
                // corpse has to clear the new one itself.
                if self.is_dead() {
                    world.exit_cell(&this);
                }
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Flips or forces the monster's state according to the difficulty.
    /// Normal alternates on every call. Hard counts calls and only flips on
    /// every fifth one, pinning the state to `Safe` in between.
    pub fn toggle_state(&self) {
        let Some(world) = self.world.upgrade() else {
            return;
        };
        let difficulty = world.difficulty();
        {
            let mut vitals = lock(&self.vitals);
            if vitals.dead {
                return;
            }
            match difficulty {
                Difficulty::Normal => vitals.state = vitals.state.toggled(),
                Difficulty::Hard => {
                    vitals.toggle_count += 1;
                    if vitals.toggle_count % 5 == 0 {
                        vitals.state = vitals.state.toggled();
                    } else {
                        vitals.state = MonsterState::Safe;
                    }
                }
            }
        }
        world.publish_change();
    }

    /// Kills the monster if it is currently vulnerable. The state check and
    /// the death mark happen under one lock, so two concurrent taps cannot
    /// both score. Returns whether this call did the killing.
    pub fn kill(&self) -> bool {
        let killed = {
            let mut vitals = lock(&self.vitals);
            if vitals.dead || vitals.state != MonsterState::Vulnerable {
                false
            } else {
                vitals.dead = true;
                true
            }
        };
        if killed {
            debug!("[Monster] {} killed at {:?}", self.id, self.position());
            self.cancel_engines();
        }
        killed
    }

    /// Unconditional kill for teardown; safe monsters die too.
    pub fn shutdown(&self) {
        lock(&self.vitals).dead = true;
        self.cancel_engines();
    }

    fn cancel_engines(&self) {
        if let Some(engines) = lock(&self.engines).take() {
            engines.movement.cancel();
            engines.state.cancel();
        }
    }

    /// Spawns the task that waits for the start gate and then schedules both
    /// engines. Manual-behavior monsters ignore the gate entirely.
    pub fn launch(&self, ready: watch::Receiver<bool>) {
        if !self.behavior.auto_engines {
            return;
        }
        let Some(monster) = self.me.upgrade() else {
            return;
        };
        let mut ready = ready;
        tokio::spawn(async move {
            if ready.wait_for(|open| *open).await.is_err() {
                return;
            }
            monster.start_engines();
        });
    }

    fn start_engines(&self) {
        let mut engines = lock(&self.engines);
        if engines.is_some() {
            return;
        }
        // A kill that landed before the gate opened wins: stay down.
        if lock(&self.vitals).dead {
            return;
        }
        let Some(me) = self.me.upgrade() else {
            return;
        };
        debug!("[Monster] {} engines starting", self.id);
        let movement = RandomIntervalEngine::spawn(self.behavior.move_interval_ms.clone(), {
            let monster = Arc::clone(&me);
            move || {
                let monster = Arc::clone(&monster);
                async move { monster.attempt_move().await }
            }
        });
        let state = RandomIntervalEngine::spawn(self.behavior.state_interval_ms.clone(), {
            let monster = Arc::clone(&me);
            move || {
                let monster = Arc::clone(&monster);
                async move { monster.toggle_state() }
            }
        });
        *engines = Some(MonsterEngines { movement, state });
    }
}
