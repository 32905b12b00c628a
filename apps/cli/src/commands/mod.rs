//! Command implementations for the tabfit CLI.

pub mod predict;
pub mod train;
