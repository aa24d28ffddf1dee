//! CLI command tests against a file-backed spec source.

use polygen_cli::commands::common::{exit_code_for, read_cached_specs};
use polygen_cli::commands::function::{build_payload, execute_kind, find_function};
use polygen_cli::commands::generate::{GenerateArgs, run_with_source};
use polygen_cli::commands::rendered_spec::select_uploadable;
use polygen_core::GeneratorConfig;
use polygen_core::cli::{ExitCode, FunctionPath, OutputFormat};
use polygen_files::FileSpecSource;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn specs() -> Value {
    json!([
        {
            "id": "srv-1",
            "context": "billing",
            "name": "charge",
            "type": "serverFunction",
            "function": {
                "arguments": [
                    {"name": "customerId", "type": {"kind": "primitive", "type": "string"}},
                    {"name": "amount", "type": {"kind": "primitive", "type": "number"}}
                ],
                "returnType": {"kind": "primitive", "type": "boolean"}
            }
        },
        {
            "id": "api-1",
            "context": "shipping",
            "name": "track",
            "type": "apiFunction",
            "function": {"arguments": [], "returnType": {"kind": "void"}}
        }
    ])
}

fn source(dir: &Path, specs: &Value) -> FileSpecSource {
    let path = dir.join("fixture.json");
    fs::write(&path, serde_json::to_string(specs).unwrap()).unwrap();
    FileSpecSource::from_path(path)
}

fn config(out: &Path) -> GeneratorConfig {
    GeneratorConfig {
        output_dir: out.to_path_buf(),
        ..GeneratorConfig::default()
    }
}

#[tokio::test]
async fn test_generate_then_resolve_function_from_cache() {
    let fixtures = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let config = config(out.path());

    let code = run_with_source(
        source(fixtures.path(), &specs()),
        &config,
        &GenerateArgs::default(),
        "https://na1.polyapi.io",
        OutputFormat::Json,
    )
    .await
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(out.path().join("poly/billing/__init__.py").exists());

    let cached = read_cached_specs(&config).unwrap();
    let path = FunctionPath::new("poly.billing.charge").unwrap();
    let spec = find_function(&cached, &path).unwrap();
    assert_eq!(spec.id.as_str(), "srv-1");
    assert_eq!(execute_kind(spec.spec_type), Some("server"));
    assert_eq!(
        build_payload(spec, Some(r#"["cus_1", 9.5]"#)).unwrap(),
        json!({"customerId": "cus_1", "amount": 9.5})
    );

    let uploadable = select_uploadable(cached, &["shipping".to_string()]);
    assert_eq!(uploadable.len(), 1);
    assert_eq!(uploadable[0].name, "track");
}

#[tokio::test]
async fn test_generate_with_no_matching_specs_fails() {
    let fixtures = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let args = GenerateArgs {
        contexts: vec!["nowhere".to_string()],
        ..GenerateArgs::default()
    };

    let err = run_with_source(
        source(fixtures.path(), &specs()),
        &config(out.path()),
        &args,
        "https://na1.polyapi.io",
        OutputFormat::Json,
    )
    .await
    .unwrap_err();

    assert_eq!(exit_code_for(&err), ExitCode::ERROR);
    assert!(!out.path().join("specs.json").exists());
}

#[test]
fn test_missing_credentials_map_to_invalid_input() {
    let out = TempDir::new().unwrap();
    let err = polygen_cli::PolyClient::from_config(&config(out.path()))
        .map(|_| ())
        .map_err(anyhow::Error::from)
        .unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::INVALID_INPUT);
}
