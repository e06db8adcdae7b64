use std::ops::Range;

/// Game configuration constants.
///
/// This module defines the main gameplay parameters such as the countdown
/// budget, monster timer ranges, and default grid dimensions.
pub const KILL_TIME_PER_MONSTER: u32 = 5; // Seconds granted per monster on the grid.

/// Interval (in milliseconds) between two countdown clock ticks.
pub const CLOCK_TICK_MS: u64 = 1000;

/// Range (in milliseconds) a monster waits between two movement attempts.
pub const MOVE_INTERVAL_MS: Range<u64> = 500..2000;

/// Range (in milliseconds) a monster waits between two state changes.
pub const STATE_INTERVAL_MS: Range<u64> = 500..3000;

/// Number of columns in the default game grid.
pub const GRID_WIDTH: i32 = 5;

/// Number of rows in the default game grid.
pub const GRID_HEIGHT: i32 = 6;

/// Number of monsters spawned by the demo game.
pub const MONSTER_COUNT: usize = 4;
