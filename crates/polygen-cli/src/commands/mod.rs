//! Command implementations for the polygen CLI.
//!
//! Each command module resolves what it needs from the configuration
//! context, performs the operation, and formats output according to the
//! requested format.

pub mod clear;
pub mod common;
pub mod function;
pub mod generate;
pub mod rendered_spec;
pub mod setup;
