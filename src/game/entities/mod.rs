//! Game entities module.
//!
//! The autonomous monster actor and its behavior strategy live here.

pub mod monster;

pub use monster::*;
