//! Core traits for the generator.
//!
//! # Module Structure
//!
//! - `spec_source` - where specs come from (HTTP, cache file, fixtures)

mod spec_source;

pub use spec_source::{SpecQuery, SpecSource};
