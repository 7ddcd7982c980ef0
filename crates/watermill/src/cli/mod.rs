//! CLI command implementations.

pub mod config;
pub mod preset;
pub mod preview;
pub mod run;
pub mod scan;
pub mod settings;
pub mod theme;
pub mod types;
