//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::{AppConfig, ConfigLoader};
use contracts::AdapterConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Registered types plus, optionally, a configuration summary
#[derive(Serialize)]
struct InformerInfo {
    version: &'static str,
    sink_types: Vec<String>,
    source_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<ConfigInfo>,
}

#[derive(Serialize)]
struct ConfigInfo {
    path: String,
    interface: String,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
    queue_size: usize,
    sink_queue_size: usize,
    shutdown_timeout_secs: u64,
    sources: Vec<AdapterInfo>,
    sinks: Vec<AdapterInfo>,
}

#[derive(Serialize)]
struct AdapterInfo {
    name: String,
    #[serde(rename = "type")]
    adapter_type: String,
}

impl From<&AdapterConfig> for AdapterInfo {
    fn from(config: &AdapterConfig) -> Self {
        Self {
            name: config.name.clone(),
            adapter_type: config.adapter_type.clone(),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration info");
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            let app = ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Some(build_config_info(&app, path.display().to_string()))
        }
        None => None,
    };

    let info = InformerInfo {
        version: env!("CARGO_PKG_VERSION"),
        sink_types: owned(dispatcher::default_sink_registry().type_names()),
        source_types: owned(sources::default_source_registry().type_names()),
        config,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize info")?;
        println!("{}", json);
    } else {
        print_info(&info);
    }

    Ok(())
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

fn build_config_info(app: &AppConfig, path: String) -> ConfigInfo {
    ConfigInfo {
        path,
        interface: app.interface.clone(),
        port: app.port,
        metrics_port: app.metrics_port,
        queue_size: app.queue_size,
        sink_queue_size: app.sink_queue_size,
        shutdown_timeout_secs: app.shutdown_timeout_secs,
        sources: app.sources.iter().map(AdapterInfo::from).collect(),
        sinks: app.sinks.iter().map(AdapterInfo::from).collect(),
    }
}

fn print_tree(items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let prefix = if i == items.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}", prefix, item);
    }
}

fn print_info(info: &InformerInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Informer v{:<31}║", info.version);
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📥 Source types");
    print_tree(&info.source_types);
    println!("\n📤 Sink types");
    print_tree(&info.sink_types);

    let Some(config) = &info.config else {
        println!();
        return;
    };

    println!("\n⚙️  Configuration ({})", config.path);
    println!("   ├─ Listen: {}:{}", config.interface, config.port);
    match config.metrics_port {
        Some(port) => println!("   ├─ Metrics port: {}", port),
        None => println!("   ├─ Metrics: disabled"),
    }
    println!(
        "   ├─ Queues: ingress {}, per sink {}",
        config.queue_size, config.sink_queue_size
    );
    println!("   └─ Shutdown timeout: {}s", config.shutdown_timeout_secs);

    let describe = |adapters: &[AdapterInfo]| -> Vec<String> {
        adapters
            .iter()
            .map(|a| format!("{} ({})", a.name, a.adapter_type))
            .collect()
    };

    println!("\n🔌 Sources ({})", config.sources.len());
    print_tree(&describe(&config.sources));
    println!("\n📬 Sinks ({})", config.sinks.len());
    print_tree(&describe(&config.sinks));
    println!();
}
