//! Table renderer.
//!
//! A table renders to a row type, a subset type (any subset of the row
//! columns), a where-filter type, the query shapes and a class with the
//! query operations. Column types for the subset and filter classes follow
//! the hoisted names the schema engine gives nested row objects.

use super::{DocFields, SpecRenderer, function_leaf};
use crate::escape::string_literal;
use crate::python::{self, map_primitive_type};
use crate::schema::nested_name;
use polygen_core::{
    Error, NamespacePath, Result, Section, SpecificationDto, TableSpecDto,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Upper bound on rows selected or inserted by a single query.
pub const MAX_ROWS: usize = 1000;

#[derive(Serialize)]
struct TableContext<'a> {
    name: &'a str,
    columns: String,
    row_classes: String,
    subset_class: String,
    where_class: String,
    max_rows: usize,
    #[serde(flatten)]
    doc: DocFields,
}

pub(super) fn render(
    renderer: &SpecRenderer,
    spec: &SpecificationDto,
) -> Result<crate::RenderedSpec> {
    let table = TableSpecDto::try_from(spec)?;
    let name = function_leaf(&table.name);
    let path = NamespacePath::new(Section::Tables, &table.context, &name)?;

    let properties = table
        .schema
        .get("properties")
        .and_then(Value::as_object)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::ValidationError {
            field: "schema.properties".to_string(),
            reason: format!("table {} has no columns", spec.qualified_name()),
        })?;
    let required: Vec<&str> = table
        .schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let row = format!("{name}Row");
    let row_source = row_classes(renderer, &table.schema, &row);
    let columns = Columns {
        declared: row_fields(&row_source, &row),
        row,
        properties,
        required: &required,
    };

    let source = renderer.templates().render(
        "sections/table",
        &TableContext {
            name: &name,
            columns: properties
                .keys()
                .map(|k| string_literal(k))
                .collect::<Vec<_>>()
                .join(","),
            row_classes: row_source,
            subset_class: columns.subset_class(&format!("{name}Subset")),
            where_class: columns.where_class(&format!("{name}WhereFilter")),
            max_rows: MAX_ROWS,
            doc: DocFields::new(&table.description, table.id.as_str()),
        },
    )?;

    Ok(crate::RenderedSpec {
        path,
        source,
        type_defs: String::new(),
    })
}

/// Row declarations without the engine's import header.
fn row_classes(renderer: &SpecRenderer, schema: &Value, row: &str) -> String {
    let resolved = renderer.mapper().schemas().render(schema, row, "Dict");
    if !resolved.has_definition() {
        return format!("{row} = Dict[str, Any]");
    }
    resolved
        .definition
        .lines()
        .filter(|line| !line.starts_with("from ") && !line.starts_with("import "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Field annotations of the `row` class as the schema engine declared
/// them, without the `Required[...]` wrapper.
fn row_fields(definition: &str, row: &str) -> HashMap<String, String> {
    let class_header = format!("class {row}(");
    let functional_header = format!("{row} = TypedDict(");
    let mut lines = definition
        .lines()
        .skip_while(|l| !l.starts_with(&class_header) && !l.starts_with(&functional_header));
    let mut fields = HashMap::new();
    let Some(header) = lines.next() else {
        return fields;
    };
    let functional = header.starts_with(&functional_header);

    for line in lines {
        if !line.starts_with("    ") {
            if line.trim().is_empty() {
                continue;
            }
            break;
        }
        let body = line.trim();
        if body.starts_with("\"\"\"") || body.starts_with('#') {
            continue;
        }
        let field = if functional {
            body.strip_suffix(',')
                .and_then(|b| b.split_once(": "))
                .map(|(k, v)| (k.trim_matches('"'), v))
        } else {
            body.split_once(": ")
        };
        if let Some((column, annotation)) = field {
            let annotation = annotation
                .strip_prefix("Required[")
                .and_then(|a| a.strip_suffix(']'))
                .unwrap_or(annotation);
            fields.insert(column.to_string(), annotation.to_string());
        }
    }
    fields
}

/// First quoted class name in an annotation, e.g. `_RowAddress2` in
/// `Union["_RowAddress2", None]`.
fn declared_class(annotation: &str) -> Option<&str> {
    let start = annotation.find('"')? + 1;
    let len = annotation[start..].find('"')?;
    let name = &annotation[start..start + len];
    (!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')).then_some(name)
}

struct Columns<'a> {
    declared: HashMap<String, String>,
    row: String,
    properties: &'a Map<String, Value>,
    required: &'a [&'a str],
}

impl Columns<'_> {
    fn is_required(&self, column: &str) -> bool {
        self.required.contains(&column)
    }

    /// Name of the nested class the row declared for `column`. Only
    /// direct object columns carry their class name in the annotation.
    fn hint(&self, column: &str, schema: &Value) -> String {
        self.declared
            .get(column)
            .filter(|_| is_direct_object(schema))
            .and_then(|annotation| declared_class(annotation))
            .map_or_else(|| nested_name(&self.row, column), ToString::to_string)
    }

    fn type_of(&self, column: &str, schema: &Value, required: bool) -> String {
        column_type(&self.hint(column, schema), schema, required)
    }

    fn subset_class(&self, class: &str) -> String {
        let fields = self
            .properties
            .iter()
            .map(|(column, schema)| {
                let ty = self.type_of(column, schema, self.is_required(column));
                (column.as_str(), format!("NotRequired[{ty}]"))
            })
            .collect::<Vec<_>>();
        typed_dict(class, &fields, &[])
    }

    fn where_class(&self, class: &str) -> String {
        let mut fields = Vec::with_capacity(self.properties.len());
        for (column, schema) in self.properties {
            let required = self.is_required(column);
            let ty = self.type_of(column, schema, true);
            let (ty, filter) = match (ty.as_str(), required) {
                ("bool", true) => (ty.clone(), "BooleanFilter"),
                ("bool", false) => (ty.clone(), "NullableBooleanFilter"),
                ("str", true) => (ty.clone(), "StringFilter"),
                ("str", false) => (ty.clone(), "NullableStringFilter"),
                ("int" | "float", true) => (ty.clone(), "NumberFilter"),
                ("int" | "float", false) => (ty.clone(), "NullableNumberFilter"),
                (_, false) => ("None".to_string(), "NullableObjectFilter"),
                (_, true) => continue,
            };
            fields.push((column.as_str(), format!("NotRequired[Union[{ty}, {filter}]]")));
        }
        let quoted = format!("\"{class}\"");
        let combinators = [
            ("AND", format!("NotRequired[Union[{quoted}, List[{quoted}]]]")),
            ("OR", format!("NotRequired[List[{quoted}]]")),
            ("NOT", format!("NotRequired[Union[{quoted}, List[{quoted}]]]")),
        ];
        typed_dict(class, &fields, &combinators)
    }
}

fn is_direct_object(schema: &Value) -> bool {
    let array_typed = match schema.get("type") {
        Some(Value::Array(types)) => types.iter().any(|t| t == "array"),
        Some(ty) => ty == "array",
        None => schema.get("items").is_some(),
    };
    !array_typed
        && schema.get("patternProperties").is_none()
        && schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| !p.is_empty())
}

/// Class syntax when every column is a usable field name, the functional
/// `TypedDict(...)` form otherwise.
fn typed_dict(class: &str, fields: &[(&str, String)], extra: &[(&str, String)]) -> String {
    let all = fields
        .iter()
        .map(|(n, t)| (*n, t.as_str()))
        .chain(extra.iter().map(|(n, t)| (*n, t.as_str())));

    if fields.iter().all(|(column, _)| is_field_name(column)) {
        let mut lines = vec![format!("class {class}(TypedDict):")];
        lines.extend(all.map(|(column, ty)| format!("    {column}: {ty}")));
        lines.join("\n")
    } else {
        let mut lines = vec![format!("{class} = TypedDict({}, {{", string_literal(class))];
        lines.extend(all.map(|(column, ty)| format!("    {}: {ty},", string_literal(column))));
        lines.push("})".to_string());
        lines.join("\n")
    }
}

fn is_field_name(column: &str) -> bool {
    !python::is_keyword(column)
        && column
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && column.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Python type of a column. `hint` is the name the schema engine gives a
/// nested object at this position.
fn column_type(hint: &str, schema: &Value, required: bool) -> String {
    let expr = match schema.get("type") {
        Some(Value::Array(types)) => {
            let members = types
                .iter()
                .map(|ty| {
                    let mut single = schema.as_object().cloned().unwrap_or_default();
                    single.insert("type".to_string(), ty.clone());
                    column_type(hint, &Value::Object(single), true)
                })
                .collect::<Vec<_>>();
            format!("Union[{}]", members.join(", "))
        }
        Some(Value::String(ty)) if ty == "array" => match schema.get("items") {
            Some(Value::Array(items)) => {
                let members = items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| column_type(&format!("{hint}Item{idx}"), item, true))
                    .collect::<Vec<_>>();
                format!("Tuple[{}]", members.join(", "))
            }
            Some(items @ Value::Object(_)) => {
                format!("List[{}]", column_type(&format!("{hint}Item"), items, true))
            }
            _ => "List[Any]".to_string(),
        },
        Some(Value::String(ty)) if ty == "object" => object_column_type(hint, schema),
        None => object_column_type(hint, schema),
        Some(Value::String(ty)) if ty == "null" => "None".to_string(),
        Some(Value::String(ty)) => map_primitive_type(ty).to_string(),
        Some(_) => "Any".to_string(),
    };
    if required {
        expr
    } else {
        format!("Optional[{expr}]")
    }
}

fn object_column_type(hint: &str, schema: &Value) -> String {
    if let Some(pattern) = schema
        .get("patternProperties")
        .and_then(Value::as_object)
        .and_then(|p| p.values().next())
    {
        return format!(
            "Dict[str, {}]",
            column_type(&format!("{hint}Value"), pattern, true)
        );
    }
    if schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
    {
        return format!("\"{hint}\"");
    }
    "Dict[str, Any]".to_string()
}
