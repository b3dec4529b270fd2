//! graft - Maven and Gradle dependency resolver
//!
//! Thin CLI over the resolver crates: loads configuration, wires the cache
//! and network stack together, runs one command and renders the result.

mod cli;
mod display;
mod error;
mod events;
mod report;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::report::CommandOutput;
use clap::Parser;
use graft_cache::FileCache;
use graft_config::{Config, RepositoryConfig};
use graft_events::{EventEmitter, EventReceiver, EventSender};
use graft_net::{HttpFetcher, NetClient, NetConfig, Repository};
use graft_resolver::{resolve_graph, ResolutionContext, ResolutionSettings};
use graft_types::ResolutionLevel;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting graft v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global)?;

    let (event_sender, event_receiver) = graft_events::channel();
    let ctx = build_context(&config, event_sender)?;

    let renderer = OutputRenderer::new(cli.global.json);
    let mut event_handler = EventHandler::new(cli.global.json, cli.global.debug);

    let run = RunSettings {
        level: config.resolution_level(),
        parallelism: config.parallelism(),
    };
    let result =
        execute_command_with_events(cli.command, &ctx, run, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    let summary = result.summary();
    if summary.errors > 0 {
        return Err(CliError::Unresolved {
            errors: summary.errors,
        });
    }

    info!("Command completed successfully");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct RunSettings {
    level: ResolutionLevel,
    parallelism: usize,
}

fn build_context(config: &Config, tx: EventSender) -> Result<ResolutionContext, CliError> {
    let client = NetClient::new(NetConfig::from(&config.network))?.with_events(tx.clone());
    let repositories = config
        .repositories
        .iter()
        .map(Repository::from_config)
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        repositories = repositories.len(),
        cache = %config.cache_root().display(),
        "resolution context ready"
    );

    let cache = FileCache::new(
        config.cache_root(),
        repositories,
        Arc::new(HttpFetcher::new(client)),
    )
    .with_algorithm(config.cache.checksum)
    .with_events(tx.clone());

    Ok(ResolutionContext::new(ResolutionSettings::from_config(config), Arc::new(cache)).with_events(tx))
}

/// Execute command with concurrent event handling
///
/// Ctrl-C cancels the resolution; the command then finishes with
/// `Cancelled` once in-flight units settle.
async fn execute_command_with_events(
    command: Commands,
    ctx: &ResolutionContext,
    run: RunSettings,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandOutput, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx, run));
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }

            signal = &mut interrupt, if !interrupted => {
                interrupted = true;
                if signal.is_ok() {
                    info!("interrupt received, cancelling");
                    ctx.cancel();
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    ctx: &ResolutionContext,
    run: RunSettings,
) -> Result<CommandOutput, CliError> {
    let graph = resolve_graph(ctx, command.roots(), run.level, run.parallelism).await?;
    if command.materializes() {
        ctx.emit_operation_started("Downloading artifacts");
        let downloaded = graph.materialize(ctx, run.level, run.parallelism).await;
        ctx.emit_operation_completed("Downloading artifacts", downloaded.is_ok());
        downloaded?;
    }

    Ok(match command {
        Commands::Resolve(_) => CommandOutput::resolve(&graph),
        Commands::Tree(_) => CommandOutput::tree(&graph),
        Commands::Classpath(_) => CommandOutput::classpath(&graph),
        Commands::Fetch(_) => CommandOutput::fetch(&graph, ctx.cache().stats()),
    })
}

/// Initialize tracing/logging
///
/// Logs go to stderr so stdout stays clean for results. In JSON mode logs
/// are JSON lines and only appear with `--debug` or `RUST_LOG`.
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let filter = |fallback: &str| {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };

    if json_mode {
        if debug_enabled {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(filter("info,graft=debug"))
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_writer(std::io::sink)
                .with_env_filter("off")
                .init();
        }
    } else if debug_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter("info,graft=debug"))
            .init();
    } else {
        // Normal mode: graft crates already report through events
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn,graft=off"))
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) -> Result<(), CliError> {
    if let Some(scope) = global.scope {
        config.resolution.scope = scope;
    }
    if let Some(platform) = global.platform {
        config.resolution.platform = platform;
    }
    if global.offline {
        config.resolution.offline = true;
    }
    if let Some(parallelism) = global.parallelism {
        if parallelism == 0 {
            return Err(CliError::InvalidArguments(
                "--parallelism must be at least 1".to_string(),
            ));
        }
        config.resolution.parallelism = parallelism;
    }
    if let Some(dir) = &global.cache_dir {
        config.cache.root = Some(dir.clone());
    }
    if !global.repositories.is_empty() {
        config.repositories = global
            .repositories
            .iter()
            .enumerate()
            .map(|(index, url)| RepositoryConfig::new(format!("repo{}", index + 1), url.as_str()))
            .collect();
    }
    Ok(())
}
