//! Auth function renderer.
//!
//! Only the three token operations of an auth provider produce code. Any
//! other auth spec renders to an empty body and is skipped by the writer.

use super::{DocFields, FunctionBody, SpecRenderer};
use crate::arguments::DefinitionSet;
use polygen_core::{Result, SpecificationDto};

fn template_for(name: &str) -> Option<&'static str> {
    match name {
        "getToken" => Some("functions/auth_get_token"),
        "refreshToken" => Some("functions/auth_refresh_token"),
        "revokeToken" => Some("functions/auth_revoke_token"),
        _ => None,
    }
}

pub(super) fn render(renderer: &SpecRenderer, spec: &SpecificationDto) -> Result<FunctionBody> {
    let Some(template) = template_for(&spec.name) else {
        tracing::debug!(spec = %spec.qualified_name(), "Auth spec has no client operation");
        return Ok(FunctionBody::default());
    };
    let source = renderer.templates().render(template, &DocFields::of(spec))?;
    Ok(FunctionBody::new(source, DefinitionSet::default()))
}
