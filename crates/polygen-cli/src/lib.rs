//! Polygen CLI library.
//!
//! Exposes the command implementations, the Poly HTTP client and the output
//! formatters used by the `polygen` binary so they can be tested.

#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

pub mod actions;
pub mod commands;
pub mod formatters;
pub mod http;

pub use actions::FunctionAction;
pub use http::{HttpSpecSource, PolyClient};
