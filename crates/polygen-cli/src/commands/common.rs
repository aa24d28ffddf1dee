//! Utilities shared across CLI commands.

use anyhow::{Context, Result, bail};
use polygen_codegen::{CommandEngine, SchemaRenderer, SpecRenderer};
use polygen_core::cli::ExitCode;
use polygen_core::{ConfigContext, GeneratorConfig, SpecificationDto};
use polygen_files::{SpecCache, expand_tilde};
use std::path::PathBuf;
use std::sync::Arc;

/// Loads the configuration context and applies global flag overrides.
///
/// `config_path` defaults to [`ConfigContext::default_path`].
///
/// # Errors
///
/// Returns an error if the configuration file exists but cannot be parsed.
pub fn load_config(
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<ConfigContext> {
    let path = config_path.or_else(ConfigContext::default_path);
    let mut ctx = ConfigContext::load(path).context("failed to load configuration")?;
    if let Some(dir) = output_dir {
        ctx.config_mut().output_dir = dir;
    }
    Ok(ctx)
}

/// Builds the renderer for the configured package name and schema engine.
///
/// # Errors
///
/// Returns an error if the templates fail to register.
pub fn build_renderer(config: &GeneratorConfig) -> Result<SpecRenderer> {
    let schemas = match config.schema_engine.as_deref() {
        None => SchemaRenderer::builtin(),
        Some(argv) => match CommandEngine::from_argv(argv) {
            Some(engine) => {
                tracing::info!(program = %engine.program(), "Using external schema engine");
                SchemaRenderer::with_engine(Arc::new(engine))
            }
            None => {
                tracing::warn!("Empty schema engine command, using the built-in engine");
                SchemaRenderer::builtin()
            }
        },
    };
    SpecRenderer::new(config.package_name.clone(), schemas).context("failed to load templates")
}

/// Spec cache of the configured package.
#[must_use]
pub fn package_cache(config: &GeneratorConfig) -> SpecCache {
    SpecCache::in_package(&expand_tilde(&config.output_dir))
}

/// Reads the spec cache written by the last `generate`.
///
/// # Errors
///
/// Returns an error if the cache is missing or unreadable.
pub fn read_cached_specs(config: &GeneratorConfig) -> Result<Vec<SpecificationDto>> {
    let cache = package_cache(config);
    if !cache.exists() {
        bail!(
            "no spec cache at {} (run `polygen generate` first)",
            cache.path().display()
        );
    }
    cache
        .read()
        .with_context(|| format!("failed to read {}", cache.path().display()))
}

/// Maps an error to the process exit code.
///
/// Bad input and missing credentials are [`ExitCode::INVALID_INPUT`];
/// failures reported by the Poly service are [`ExitCode::SERVER_ERROR`].
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let Some(core) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<polygen_core::Error>())
    else {
        return ExitCode::ERROR;
    };
    if core.is_remote_error() {
        ExitCode::SERVER_ERROR
    } else if core.is_missing_credentials()
        || core.is_config_error()
        || core.is_validation_error()
        || matches!(core, polygen_core::Error::InvalidArgument(_))
    {
        ExitCode::INVALID_INPUT
    } else {
        ExitCode::ERROR
    }
}
