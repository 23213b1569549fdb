pub mod assist;
pub mod card;
pub mod config;
pub mod game;
pub mod replacement;
pub mod targeting;
