//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{validate_adapters, AppConfig, ConfigLoader};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    listen: String,
    queue_size: usize,
    sink_queue_size: usize,
    source_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return invalid(config_path, format!("File not found: {}", args.config.display()));
    }

    let config = match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => return invalid(config_path, e.to_string()),
    };

    if let Err(e) = validate_adapters(
        &config,
        &dispatcher::default_sink_registry(),
        &sources::default_source_registry(),
    ) {
        return invalid(config_path, e.to_string());
    }

    let warnings = collect_warnings(&config);
    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            listen: format!("{}:{}", config.interface, config.port),
            queue_size: config.queue_size,
            sink_queue_size: config.sink_queue_size,
            source_count: config.sources.len(),
            sink_count: config.sinks.len(),
        }),
    }
}

fn invalid(config_path: String, error: String) -> ValidationResult {
    ValidationResult {
        valid: false,
        config_path,
        error: Some(error),
        warnings: None,
        summary: None,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sinks.is_empty() {
        warnings.push("No sinks configured - every event will be discarded".to_string());
    }

    if config.sources.is_empty() {
        warnings.push("No sources configured - every webhook will get 404".to_string());
    }

    for source in &config.sources {
        if source.name.contains('/') {
            warnings.push(format!(
                "Source '{}' contains '/' and cannot be addressed under /webhook/{{source}}",
                source.name
            ));
        }
    }

    if config.metrics_port == Some(config.port) {
        warnings.push(format!(
            "metrics_port and port are both {} - one of the listeners will fail to bind",
            config.port
        ));
    }

    if config.shutdown_timeout_secs == 0 {
        warnings.push("shutdown_timeout_secs is 0 - queued events are dropped at exit".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Listen: {}", summary.listen);
            println!(
                "  Queues: ingress {}, per sink {}",
                summary.queue_size, summary.sink_queue_size
            );
            println!("  Sources: {}", summary.source_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn validate_toml(content: &str) -> ValidationResult {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        })
    }

    #[test]
    fn test_valid_config_with_summary() {
        let result = validate_toml(
            r#"
port = 9090

[[sources]]
name = "radarr"
type = "radarr"

[[sinks]]
name = "log"
type = "log"
"#,
        );
        assert!(result.valid, "{:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.listen, "0.0.0.0:9090");
        assert_eq!(summary.source_count, 1);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_unknown_sink_type_is_invalid() {
        let result = validate_toml(
            r#"
[[sinks]]
name = "pager"
type = "pagerduty"
"#,
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("pagerduty"));
    }

    #[test]
    fn test_rejected_adapter_config_is_invalid() {
        let result = validate_toml(
            r#"
[[sinks]]
name = "discord"
type = "discord-webhook"

[sinks.config]
webhook_url = "https://example.com/not-a-webhook"
"#,
        );
        assert!(!result.valid);
    }

    #[test]
    fn test_empty_config_warns() {
        let result = validate_toml("");
        assert!(result.valid);
        assert_eq!(result.warnings.unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: PathBuf::from("/nonexistent/informer.toml"),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
