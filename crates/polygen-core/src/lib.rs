//! Core types, traits, and errors for the Poly Python SDK generator.
//!
//! This crate provides the foundational types and abstractions used across
//! all other crates in the polygen workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - The spec data model (`SpecificationDto`, `PropertyType`, `SchemaSpecDto`)
//! - Strong domain types (`SpecId`, `NamespacePath`, `Section`)
//! - Error hierarchy with contextual information
//! - The [`traits::SpecSource`] seam through which specs are fetched
//! - The explicit configuration context ([`ConfigContext`])

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod error;
mod spec;
mod types;

pub mod cli;
pub mod traits;

pub use config::{ConfigContext, GeneratorConfig, is_valid_api_url};
pub use error::{Error, Result};
pub use spec::{
    ArrayItems, FunctionSpecification, PropertySpecification, PropertyType, SchemaSpecDto,
    SpecType, SpecificationDto, TableSpecDto, VariableSpecDto, VariableSpecification,
};
pub use types::{NamespacePath, Section, SpecId};
