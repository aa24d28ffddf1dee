//! Client function renderer.
//!
//! The function's own source is embedded in a `try`/`except ImportError`
//! block so a missing third-party import only disables that function.

use super::{FunctionBody, SpecRenderer};
use crate::arguments::ArgumentRenderer;
use crate::escape::indent_continuation;
use polygen_core::{FunctionSpecification, Result, SpecificationDto};
use serde::Serialize;

#[derive(Serialize)]
struct ClientContext {
    code: String,
}

pub(super) fn render(
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
    leaf: &str,
    function: &FunctionSpecification,
) -> Result<FunctionBody> {
    let args = ArgumentRenderer::new(renderer.mapper()).render(leaf, &function.arguments);
    let returns = renderer.mapper().resolve(&function.return_type, "");

    let mut definitions = args.definitions;
    definitions.push(&returns.definition);

    let code = spec.code.as_deref().map(str::trim).unwrap_or_default();
    let code = if code.is_empty() { "pass" } else { code };

    let source = renderer.templates().render(
        "functions/client",
        &ClientContext {
            code: indent_continuation(code, "    "),
        },
    )?;

    Ok(FunctionBody::new(source, definitions))
}
