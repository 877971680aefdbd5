pub mod action;
pub mod config;
pub mod probe;
pub mod serdable;
pub mod style;
pub mod testing;

pub use crate::config::Config;
