//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use graft_types::{Coordinate, Platform, Scope};
use std::path::PathBuf;

/// graft - Maven and Gradle dependency resolver
#[derive(Parser)]
#[command(name = "graft")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Maven and Gradle dependency resolver")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dependency scope to resolve for
    #[arg(long, global = true, value_enum)]
    pub scope: Option<Scope>,

    /// Kotlin target platform used for variant selection
    #[arg(long, global = true, value_enum)]
    pub platform: Option<Platform>,

    /// Only use files already in the local cache
    #[arg(long, global = true)]
    pub offline: bool,

    /// Repository URL; repeat to search several in order. Replaces the
    /// configured repositories.
    #[arg(long = "repo", global = true, value_name = "URL")]
    pub repositories: Vec<String>,

    /// Concurrent resolutions and downloads
    #[arg(long, global = true, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Artifact cache directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Coordinates to start from
#[derive(Args)]
pub struct RootArgs {
    /// Coordinates as group:module:version
    #[arg(required = true, value_name = "GROUP:MODULE:VERSION", value_parser = Coordinate::parse)]
    pub coordinates: Vec<Coordinate>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the graph and list every unit with its diagnostics
    Resolve(RootArgs),

    /// Print the dependency tree
    Tree(RootArgs),

    /// Resolve, download and print the classpath
    #[command(alias = "cp")]
    Classpath(RootArgs),

    /// Resolve and download every artifact file
    Fetch(RootArgs),
}

impl Commands {
    pub fn roots(&self) -> &[Coordinate] {
        match self {
            Self::Resolve(args) | Self::Tree(args) | Self::Classpath(args) | Self::Fetch(args) => {
                &args.coordinates
            }
        }
    }

    /// Whether the command downloads artifact files after resolving
    pub fn materializes(&self) -> bool {
        matches!(self, Self::Classpath(_) | Self::Fetch(_))
    }
}
