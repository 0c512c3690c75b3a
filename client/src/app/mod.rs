//! Application host: configuration, wiring and the CLI commands

pub mod commands;
pub mod options;
pub mod render;
pub mod run;
pub mod settings;
