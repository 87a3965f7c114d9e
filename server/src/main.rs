use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tempo_server::config::AppConfig;
use tempo_server::db::pool::{create_pool, run_migrations};
use tempo_server::engine::platform::{LiveSet, StaticDirectory};
use tempo_server::engine::slowmode::{Scope, SlowmodeConfig};
use tempo_server::engine::slowmode_engine::SlowmodeEngine;
use tempo_server::engine::sweeper::SanitizationSweeper;

/// Administer per-channel slowmodes: set rules, reset cooldowns, and
/// sanitize stored state against the platform's live server/channel set.
#[derive(Parser)]
#[command(name = "tempo-server", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "tempo.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or replace a channel's slowmode.
    Set {
        channel_id: String,
        server_id: String,
        /// Slowmode interval in seconds (1 to 31536000).
        interval: i64,
        /// Content types the interval applies to: text, image, or both.
        #[arg(long, default_value = "both")]
        scope: String,
        /// User always subject to the slowmode (repeatable).
        #[arg(long = "include-user")]
        include_users: Vec<String>,
        /// User never subject to the slowmode (repeatable).
        #[arg(long = "exclude-user")]
        exclude_users: Vec<String>,
        /// Role whose holders are subject to the slowmode (repeatable).
        #[arg(long = "include-role")]
        include_roles: Vec<String>,
        /// Role whose holders are exempt from the slowmode (repeatable).
        #[arg(long = "exclude-role")]
        exclude_roles: Vec<String>,
    },

    /// Remove a channel's slowmode entirely.
    Remove { channel_id: String },

    /// Clear cooldown entries for the listed users, or all entries if
    /// none are given. The rule set is untouched.
    Reset {
        channel_id: String,
        user_ids: Vec<String>,
    },

    /// Show a channel's slowmode rule and active cooldown count.
    Status { channel_id: String },

    /// Run one sanitization pass against the given live set.
    Sanitize {
        #[arg(long, value_delimiter = ',')]
        live_servers: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        live_channels: Vec<String>,
    },

    /// Sweep periodically against the given live set until interrupted.
    Sweep {
        #[arg(long, value_delimiter = ',')]
        live_servers: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        live_channels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config);

    let pool = create_pool(&config.database.url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let engine = SlowmodeEngine::new(pool.clone());
    let result = dispatch(cli.command, &engine, &pool, &config).await;

    // Orderly shutdown either way; a persistence error must not leave the
    // process running against a store in an unknown state.
    pool.close().await;
    if let Err(ref err) = result {
        error!(error = %err, "command failed, database connection closed");
    }
    result
}

async fn dispatch(
    command: Command,
    engine: &SlowmodeEngine,
    pool: &sqlx::SqlitePool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    match command {
        Command::Set {
            channel_id,
            server_id,
            interval,
            scope,
            include_users,
            exclude_users,
            include_roles,
            exclude_roles,
        } => {
            let scope = Scope::parse(&scope)
                .with_context(|| format!("unknown scope '{scope}' (expected text, image, or both)"))?;
            let slowmode = SlowmodeConfig::new(
                channel_id,
                server_id,
                interval,
                scope,
                to_set(include_users),
                to_set(exclude_users),
                to_set(include_roles),
                to_set(exclude_roles),
            )?;
            // The operator supplies the IDs directly, so reference
            // verification uses the accept-all directory.
            let directory = StaticDirectory::new(LiveSet::default());
            engine
                .create_or_replace_slowmode(slowmode, &directory)
                .await?;
        }
        Command::Remove { channel_id } => {
            if engine.remove_slowmode(&channel_id).await? {
                println!("slowmode removed from channel {channel_id}");
            } else {
                println!("channel {channel_id} has no slowmode");
            }
        }
        Command::Reset {
            channel_id,
            user_ids,
        } => match engine.reset_cooldowns(&channel_id, &user_ids).await? {
            Some(cleared) => println!("cleared {cleared} cooldown entries in {channel_id}"),
            None => println!("channel {channel_id} has no slowmode"),
        },
        Command::Status { channel_id } => match engine.status(&channel_id).await? {
            Some(slowmode) => {
                println!(
                    "channel {}: every {}s ({}), {} user include(s), {} user exclude(s), \
                     {} role include(s), {} role exclude(s), {} active cooldown(s)",
                    slowmode.channel_id(),
                    slowmode.interval_seconds(),
                    slowmode.scope().as_str(),
                    slowmode.user_includes().len(),
                    slowmode.user_excludes().len(),
                    slowmode.role_includes().len(),
                    slowmode.role_excludes().len(),
                    slowmode.cooldowns().len(),
                );
            }
            None => println!("channel {channel_id} has no slowmode"),
        },
        Command::Sanitize {
            live_servers,
            live_channels,
        } => {
            let report = engine.sanitize(&live_servers, &live_channels).await?;
            println!(
                "deleted {} channel(s), expired {} cooldown entry(ies)",
                report.deleted_channels, report.expired_cooldowns
            );
        }
        Command::Sweep {
            live_servers,
            live_channels,
        } => {
            let directory = Arc::new(StaticDirectory::new(LiveSet {
                server_ids: live_servers,
                channel_ids: live_channels,
            }));
            let sweeper = SanitizationSweeper::new(pool.clone(), directory);
            let every = Duration::from_secs(config.sweep.interval_minutes.max(1) * 60);
            let shutdown = CancellationToken::new();

            let signal_token = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, stopping sweeper");
                    signal_token.cancel();
                }
            });

            sweeper.run_periodic(every, shutdown).await?;
        }
    }
    Ok(())
}

fn to_set(ids: Vec<String>) -> HashSet<String> {
    ids.into_iter().collect()
}
