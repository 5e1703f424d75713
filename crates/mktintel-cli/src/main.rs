mod commands;
mod setup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mktintel_core::{ArtifactKind, Platform};

#[derive(Debug, Parser)]
#[command(name = "mktintel")]
#[command(about = "Marketing discovery and caching engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the cache fingerprint of a business profile
    Fingerprint {
        /// YAML business profile
        #[arg(long)]
        profile: PathBuf,
    },
    /// Discover competitors or influencers, or generate campaign ideas
    Discover {
        #[arg(long)]
        profile: PathBuf,
        /// competitors, influencers or campaigns
        #[arg(long)]
        kind: ArtifactKind,
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Ignore and demote any cached entry
        #[arg(long)]
        force_refresh: bool,
    },
    /// Like `discover`, printing one JSON event per line as items arrive
    Stream {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        kind: ArtifactKind,
        #[arg(long, default_value = "5")]
        count: usize,
        #[arg(long)]
        force_refresh: bool,
    },
    /// Demote the current cache entry for a profile
    Invalidate {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        kind: ArtifactKind,
    },
    /// List every cache entry generated for a profile, newest first
    History {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        kind: ArtifactKind,
    },
    /// Mark the current cache entry as seen
    Viewed {
        #[arg(long)]
        profile: PathBuf,
        #[arg(long)]
        kind: ArtifactKind,
    },
    /// Summarise recent posts of competitor accounts
    Activity {
        #[arg(long)]
        profile: PathBuf,
        /// Handle to check; repeatable. Defaults to the profile's competitors
        #[arg(long = "handle")]
        handles: Vec<String>,
        /// Platform to query; defaults to the industry's primary platform
        #[arg(long)]
        platform: Option<Platform>,
        #[arg(long, default_value = "5")]
        posts_per_handle: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = mktintel_core::load_app_config()?;
    setup::init_tracing(&config);

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(error = %format!("{e:#}"), "command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, config: &mktintel_core::AppConfig) -> anyhow::Result<()> {
    if let Commands::Fingerprint { profile } = &command {
        return commands::run_fingerprint(&setup::load_profile(profile)?);
    }

    let engine = setup::build_engine(config).await?;
    match command {
        // handled above without touching the cache
        Commands::Fingerprint { .. } => Ok(()),
        Commands::Discover {
            profile,
            kind,
            limit,
            force_refresh,
        } => {
            let context = setup::load_profile(&profile)?;
            commands::run_discover(&engine, &context, kind, limit, force_refresh).await
        }
        Commands::Stream {
            profile,
            kind,
            count,
            force_refresh,
        } => {
            let context = setup::load_profile(&profile)?;
            commands::run_stream(&engine, &context, kind, count, force_refresh).await
        }
        Commands::Invalidate { profile, kind } => {
            let context = setup::load_profile(&profile)?;
            commands::run_invalidate(&engine, &context, kind).await
        }
        Commands::History { profile, kind } => {
            let context = setup::load_profile(&profile)?;
            commands::run_history(&engine, &context, kind).await
        }
        Commands::Viewed { profile, kind } => {
            let context = setup::load_profile(&profile)?;
            commands::run_viewed(&engine, &context, kind).await
        }
        Commands::Activity {
            profile,
            handles,
            platform,
            posts_per_handle,
        } => {
            let context = setup::load_profile(&profile)?;
            commands::run_activity(&engine, &context, handles, platform, posts_per_handle).await
        }
    }
}
