//! Snapshot rendering (terminal).
//!
//! Prints the world the way a subscriber sees it: a status line and one glyph
//! per cell.

use crate::game::types::{CellIcon, WorldSnapshot};

/// Print a snapshot to the terminal. `.` empty, `o` safe, `X` vulnerable.
pub fn print_snapshot(snapshot: &WorldSnapshot) {
    println!(
        "mode: {:?} | time left: {}s | score: {:?} | monsters alive: {}",
        snapshot.mode, snapshot.time_remaining, snapshot.score, snapshot.monsters_alive
    );
    for row in &snapshot.cells {
        for icon in row {
            let symbol = match icon {
                CellIcon::Blank => '.',
                CellIcon::Safe => 'o',
                CellIcon::Vulnerable => 'X',
            };
            print!("{} ", symbol);
        }
        println!();
    }
    println!();
}
