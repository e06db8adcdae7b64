// Demo module for the game. Provides the interactive terminal round and the
// snapshot renderer it draws with.
pub mod game_loop;
pub mod render;

pub use game_loop::run_demo;
