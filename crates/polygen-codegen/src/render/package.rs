//! Package-level files: the root `__init__.py`, `runtime.py` and the
//! section aggregator preambles.

use super::SpecRenderer;
use crate::escape::string_literal;
use crate::types::GeneratedFile;
use polygen_core::{Result, Section};
use serde::Serialize;

#[derive(Serialize)]
struct PackageContext<'a> {
    package: &'a str,
}

#[derive(Serialize)]
struct InitContext {
    section_imports: String,
}

#[derive(Serialize)]
struct RuntimeContext<'a> {
    package: &'a str,
    default_base_url: String,
}

pub(super) fn preamble(renderer: &SpecRenderer, section: Section) -> Result<String> {
    let template = match section {
        Section::Functions | Section::Variables => "package/code_preamble",
        Section::Schemas => "package/schemas_preamble",
        Section::Tables => "package/tables_preamble",
    };
    renderer.templates().render(
        template,
        &PackageContext {
            package: renderer.package(),
        },
    )
}

pub(super) fn root_files(
    renderer: &SpecRenderer,
    default_base_url: &str,
) -> Result<Vec<GeneratedFile>> {
    let section_imports = Section::ALL
        .iter()
        .map(|section| format!("from . import {section}"))
        .collect::<Vec<_>>()
        .join("\n");

    let init = renderer
        .templates()
        .render("package/init", &InitContext { section_imports })?;
    let runtime = renderer.templates().render(
        "package/runtime",
        &RuntimeContext {
            package: renderer.package(),
            default_base_url: string_literal(default_base_url),
        },
    )?;

    Ok(vec![
        GeneratedFile {
            path: "__init__.py".to_string(),
            content: init,
        },
        GeneratedFile {
            path: "runtime.py".to_string(),
            content: runtime,
        },
    ])
}
