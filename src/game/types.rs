use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    /// Sentinel for a monster that currently occupies no cell.
    /// Deliberately out of bounds so border checks reject it.
    pub const DETACHED: Coordinate = Coordinate { x: -1, y: -1 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate one step away in `direction`. Does not check bounds.
    pub fn step(self, direction: Direction) -> Coordinate {
        let (dx, dy) = direction.delta();
        Coordinate {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The eight compass directions plus staying put. North is towards row zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    NoMove,
}

impl Direction {
    /// The eight moving directions, for random picks.
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::NoMove => (0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterState {
    Safe,
    Vulnerable,
}

impl MonsterState {
    pub fn toggled(self) -> MonsterState {
        match self {
            MonsterState::Safe => MonsterState::Vulnerable,
            MonsterState::Vulnerable => MonsterState::Safe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Paused,
    Running,
    Stopped,
}

/// Letter grade for the time left on the clock, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

/// What a cell displays: empty, or a monster in one of its two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellIcon {
    Blank,
    Safe,
    Vulnerable,
}

/// Immutable picture of the world published to subscribers after each change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub width: i32,
    pub height: i32,
    /// Row-major display icons, `cells[y][x]`.
    pub cells: Vec<Vec<CellIcon>>,
    pub mode: GameMode,
    pub time_remaining: u32,
    pub score: Grade,
    pub monsters_alive: usize,
}

impl Default for WorldSnapshot {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            mode: GameMode::Paused,
            time_remaining: 0,
            score: Grade::F,
            monsters_alive: 0,
        }
    }
}
