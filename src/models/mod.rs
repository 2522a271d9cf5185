//! Core data models for the team builder.

mod player;
mod role;
mod team;

pub use player::*;
pub use role::*;
pub use team::*;
