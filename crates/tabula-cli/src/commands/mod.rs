//! CLI command implementations.

pub mod config;
pub mod generate;
pub mod localization;
pub mod script;
pub mod sync;
pub mod validate;
