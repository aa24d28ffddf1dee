//! Setup command implementation.
//!
//! Stores the Poly credentials in the configuration file and generates the
//! library. Values not given as flags are asked for interactively.

use super::generate::{self, GenerateArgs};
use crate::formatters::success_line;
use anyhow::{Context, Result, bail};
use polygen_core::cli::{ExitCode, OutputFormat};
use polygen_core::{ConfigContext, is_valid_api_url};
use secrecy::SecretString;

/// Base URL offered when nothing is configured yet.
pub const DEFAULT_BASE_URL: &str = "https://na1.polyapi.io";

/// Flags accepted by `setup`.
#[derive(Debug, Clone, Default)]
pub struct SetupArgs {
    /// API key; prompted for when absent.
    pub api_key: Option<String>,
    /// Tenant base URL; prompted for when absent.
    pub api_base_url: Option<String>,
    /// Only store the configuration.
    pub skip_generate: bool,
}

/// Runs the setup command.
///
/// # Errors
///
/// Returns an error if input cannot be read, a value is invalid, the
/// configuration cannot be saved, or the follow-up generation fails.
pub async fn run(
    ctx: &mut ConfigContext,
    args: SetupArgs,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let allow_custom = ctx.config().allow_custom_hosts;

    let base_url = match args.api_base_url {
        Some(url) => {
            if !is_valid_api_url(&url, allow_custom) {
                bail!("'{url}' is not a valid Poly API base URL");
            }
            url
        }
        None => {
            let current = ctx
                .config()
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            prompt_base_url(&current, allow_custom)?
        }
    };

    let api_key = match args.api_key {
        Some(key) if !key.trim().is_empty() => key,
        Some(_) => bail!("API key cannot be empty"),
        None => prompt_api_key()?,
    };

    let config = ctx.config_mut();
    config.api_base_url = Some(base_url.trim_end_matches('/').to_string());
    config.api_key = Some(SecretString::from(api_key));
    ctx.config().validate().context("invalid configuration")?;
    ctx.save().context("failed to save configuration")?;

    if let Some(path) = ctx.path() {
        eprintln!("{}", success_line(&format!("Configuration saved to {}", path.display())));
    }

    if args.skip_generate {
        return Ok(ExitCode::SUCCESS);
    }
    generate::run(ctx, &GenerateArgs::default(), output_format).await
}

fn prompt_base_url(default: &str, allow_custom: bool) -> Result<String> {
    use dialoguer::Input;

    loop {
        let input: String = Input::new()
            .with_prompt("Poly API base URL")
            .default(default.to_string())
            .interact_text()
            .context("failed to read user input")?;

        if is_valid_api_url(&input, allow_custom) {
            return Ok(input);
        }
        eprintln!("Invalid base URL: {input}");
        eprintln!("Expected https://<region>.polyapi.io (na1, na2, eu1, eu2, dev) or a localhost URL");
    }
}

fn prompt_api_key() -> Result<String> {
    use dialoguer::Password;

    Password::new()
        .with_prompt("Poly API key")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("API key cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .context("failed to read user input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> ConfigContext {
        ConfigContext::load_with(Some(dir.path().join("config.toml")), |_| None).unwrap()
    }

    #[tokio::test]
    async fn test_setup_with_flags_saves_config() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let args = SetupArgs {
            api_key: Some("secret-key".to_string()),
            api_base_url: Some("https://eu1.polyapi.io/".to_string()),
            skip_generate: true,
        };

        let code = run(&mut ctx, args, OutputFormat::Json).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let reloaded = context(&dir);
        assert_eq!(
            reloaded.config().api_base_url.as_deref(),
            Some("https://eu1.polyapi.io")
        );
        assert_eq!(
            reloaded.config().api_key.as_ref().unwrap().expose_secret(),
            "secret-key"
        );
    }

    #[tokio::test]
    async fn test_setup_rejects_unknown_host() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let args = SetupArgs {
            api_key: Some("k".to_string()),
            api_base_url: Some("https://evil.example.com".to_string()),
            skip_generate: true,
        };
        assert!(run(&mut ctx, args, OutputFormat::Json).await.is_err());
        assert!(!dir.path().join("config.toml").exists());
    }

    #[tokio::test]
    async fn test_setup_rejects_blank_key() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let args = SetupArgs {
            api_key: Some("  ".to_string()),
            api_base_url: Some(DEFAULT_BASE_URL.to_string()),
            skip_generate: true,
        };
        assert!(run(&mut ctx, args, OutputFormat::Json).await.is_err());
    }
}
