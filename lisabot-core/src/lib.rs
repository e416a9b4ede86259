// src/lib.rs

pub mod config;
pub mod model;
pub mod platforms;
pub mod random;
pub mod recorder;
pub mod services;
pub mod state;
pub mod tasks;

pub use config::BotConfig;
pub use lisabot_common::error::Error;
