//! CLI library components for the excel decoder.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
