//! Scripted subcommands

pub mod predict;
pub mod remote;
pub mod train;
