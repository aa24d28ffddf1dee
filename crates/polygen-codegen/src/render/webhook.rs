//! Webhook handle renderer.
//!
//! A webhook renders an async registration function bound to a fresh
//! events client id. Failures are logged and yield an empty body; one
//! broken webhook never stops generation.

use super::{DocFields, FunctionBody, SpecRenderer};
use crate::escape::string_literal;
use polygen_core::{Error, NamespacePath, Result, Section, SpecificationDto};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Serialize)]
struct WebhookContext<'a> {
    name: &'a str,
    package: &'a str,
    start_message: String,
    client_id: String,
    path_literal: String,
    #[serde(flatten)]
    doc: DocFields,
}

pub(super) fn render(renderer: &SpecRenderer, spec: &SpecificationDto, leaf: &str) -> FunctionBody {
    let path = NamespacePath::new(Section::Functions, &spec.context, leaf)
        .map_or_else(|_| spec.qualified_name(), |p| p.to_string());

    let context = WebhookContext {
        name: leaf,
        package: renderer.package(),
        start_message: string_literal(&format!("Starting webhook handler for {path}...")),
        client_id: string_literal(&Uuid::new_v4().to_string()),
        path_literal: string_literal(&path),
        doc: DocFields::of(spec),
    };

    let rendered = validate_arguments(spec)
        .and_then(|()| renderer.templates().render("functions/webhook", &context));
    match rendered {
        Ok(source) => FunctionBody {
            source,
            ..FunctionBody::default()
        },
        Err(err) => {
            tracing::warn!(
                spec = %spec.qualified_name(),
                error = %err,
                "Failed to render webhook handle, skipping"
            );
            FunctionBody::default()
        }
    }
}

/// Event payload arguments need distinct, non-empty names.
fn validate_arguments(spec: &SpecificationDto) -> Result<()> {
    let Some(function) = &spec.function else {
        return Ok(());
    };
    let mut seen = HashSet::new();
    for (idx, argument) in function.arguments.iter().enumerate() {
        let name = argument.name.trim();
        let reason = if name.is_empty() {
            "argument has no name".to_string()
        } else if !seen.insert(name) {
            format!("duplicate argument {name}")
        } else {
            continue;
        };
        return Err(Error::ValidationError {
            field: format!("function.arguments[{idx}].name"),
            reason,
        });
    }
    Ok(())
}
