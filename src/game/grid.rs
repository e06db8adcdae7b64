use std::sync::{Arc, Mutex};

use crate::game::entities::Monster;
use crate::game::types::{CellIcon, Coordinate, MonsterState};
use crate::game::utils::{lock, try_lock};

/// Occupancy grid. Each cell is one slot; holding a slot's lock and being its
/// occupant are the same write, so occupancy can never disagree with the lock.
pub struct CellGrid {
    width: i32,
    height: i32,
    slots: Vec<Mutex<Option<Arc<Monster>>>>,
}

impl CellGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let slots = (0..width * height).map(|_| Mutex::new(None)).collect();
        Self {
            width,
            height,
            slots,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_beyond_border(&self, x: i32, y: i32) -> bool {
        x < 0 || y < 0 || x >= self.width || y >= self.height
    }

    fn slot(&self, coord: Coordinate) -> Option<&Mutex<Option<Arc<Monster>>>> {
        if self.is_beyond_border(coord.x, coord.y) {
            return None;
        }
        self.slots.get((coord.x + coord.y * self.width) as usize)
    }

    /// Non-blocking claim of `coord` for `monster`. A cell whose slot is
    /// contended right now counts as occupied; the caller retries, not waits.
    pub fn try_occupy(&self, coord: Coordinate, monster: &Arc<Monster>) -> bool {
        let Some(slot) = self.slot(coord) else {
            return false;
        };
        let Some(mut guard) = try_lock(slot) else {
            return false;
        };
        if guard.is_some() {
            return false;
        }
        *guard = Some(Arc::clone(monster));
        true
    }

    /// Releases `coord` only if `monster` is its current occupant.
    pub fn vacate(&self, coord: Coordinate, monster: &Arc<Monster>) -> bool {
        let Some(slot) = self.slot(coord) else {
            return false;
        };
        let mut guard = lock(slot);
        match guard.as_ref() {
            Some(occupant) if occupant.id() == monster.id() => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    pub fn occupant(&self, coord: Coordinate) -> Option<Arc<Monster>> {
        let slot = self.slot(coord)?;
        lock(slot).clone()
    }

    pub fn icon_at(&self, coord: Coordinate) -> CellIcon {
        let Some(slot) = self.slot(coord) else {
            return CellIcon::Blank;
        };
        match lock(slot).as_ref() {
            None => CellIcon::Blank,
            Some(occupant) => match occupant.state() {
                MonsterState::Safe => CellIcon::Safe,
                MonsterState::Vulnerable => CellIcon::Vulnerable,
            },
        }
    }

    pub fn free_cells(&self) -> Vec<Coordinate> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Coordinate::new(x, y)))
            .filter(|coord| self.slot(*coord).is_some_and(|slot| lock(slot).is_none()))
            .collect()
    }

    pub fn occupants(&self) -> Vec<Arc<Monster>> {
        self.slots
            .iter()
            .filter_map(|slot| lock(slot).clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| lock(slot).is_none())
    }
}
