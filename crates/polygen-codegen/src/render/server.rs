//! Server function renderer.

use super::{DocFields, FunctionBody, SpecRenderer};
use crate::arguments::ArgumentRenderer;
use crate::python::qualify_type;
use polygen_core::{FunctionSpecification, Result, SpecificationDto};
use serde::Serialize;

#[derive(Serialize)]
struct ServerContext<'a> {
    name: &'a str,
    parameters: String,
    return_type: String,
    payload: String,
    return_action: &'static str,
    #[serde(flatten)]
    doc: DocFields,
}

/// Python expression that decodes a server response for `return_type`.
///
/// # Examples
///
/// ```
/// use polygen_codegen::render::server_return_action;
///
/// assert_eq!(server_return_action("str"), "resp.text");
/// assert_eq!(server_return_action("int"), "int(resp.text.replace('(int) ', ''))");
/// assert_eq!(server_return_action("_getPet.Pet"), "resp.json()");
/// ```
#[must_use]
pub fn server_return_action(return_type: &str) -> &'static str {
    match return_type {
        "str" | "Any" => "resp.text",
        "int" => "int(resp.text.replace('(int) ', ''))",
        "float" => "float(resp.text.replace('(float) ', ''))",
        "bool" => "False if resp.text == 'False' else True",
        "None" => "None",
        _ => "resp.json()",
    }
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

    let source = renderer.templates().render(
        "functions/server",
        &ServerContext {
            name: leaf,
            parameters: args.parameters,
            return_type: qualify_type(leaf, &returns.expr),
            payload: args.payload,
            return_action: server_return_action(&returns.expr),
            doc: DocFields::of(spec),
        },
    )?;

    Ok(FunctionBody::new(source, definitions))
}
