pub mod config;
pub mod sfx;
