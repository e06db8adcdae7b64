pub mod types;
pub mod utils;
pub mod engine;
pub mod clock;

pub mod grid;
pub mod entities;
pub mod world;
pub mod notifier;
pub mod session;
pub mod demo;
