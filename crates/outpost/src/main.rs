mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::watch;

use cli::{CliArgs, Commands};
use outpost_core::{ClientConfig, Orchestrator, PluginCatalog, ReexecRestarter, TcpTransport};

/// Every plugin package shipped with the binary.
fn bundled_catalog() -> Result<PluginCatalog, outpost_core::plugin_system::RegistryError> {
    let mut catalog = PluginCatalog::new();
    catalog.register(core_status::PLUGIN_NAME, core_status::factory)?;
    catalog.register(notice_board::PLUGIN_NAME, notice_board::factory)?;
    Ok(catalog)
}

fn load_config(args: &CliArgs) -> Result<ClientConfig, outpost_core::ConfigError> {
    match &args.config {
        Some(path) => ClientConfig::load(path),
        None => Ok(ClientConfig::default()),
    }
}

fn init_logging(config: &ClientConfig) {
    // Validated at load time
    let level = config.log_level_filter().unwrap_or(log::LevelFilter::Info);
    // RUST_LOG, when set, overrides the configured level
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn list_plugins(catalog: &PluginCatalog, config: &ClientConfig) -> ExitCode {
    let plugin_set = match config.plugin_set() {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Invalid plugin configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Bundled plugins:");
    for name in catalog.names() {
        let partition = plugin_set
            .partition_of(&name)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "not configured".to_string());
        println!("  - {} ({})", name, partition);
    }
    ExitCode::SUCCESS
}

/// Resolves once Ctrl-C or SIGTERM arrives.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Cannot listen for SIGTERM: {}", e),
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = match bundled_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Fatal: failed to register bundled plugins: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(Commands::Plugins) = args.command {
        return list_plugins(&catalog, &config);
    }

    init_logging(&config);
    if config.plugins.core.is_empty() && config.plugins.optional.is_empty() {
        warn!("No plugins configured");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown requested");
        shutdown_tx.send_replace(true);
    });

    let transport = Arc::new(TcpTransport::new(config.client_name.clone()));
    let restarter = Arc::new(ReexecRestarter::new());
    let mut orchestrator = match Orchestrator::new(config, catalog, transport, restarter, shutdown_rx) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Failed to initialise: {}", e);
            eprintln!("Failed to initialise: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.run().await {
        Ok(()) => {
            info!("Shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
