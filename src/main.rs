//! Main entry point for the terminal game.
//!
//! Initializes logging and runs the interactive demo round: autonomous
//! monsters roam the grid while the player taps vulnerable ones before the
//! countdown runs out.

pub mod config;
mod game;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable.
    env_logger::init();

    game::demo::run_demo().await
}
