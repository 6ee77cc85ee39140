use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mariadb_operator::backup::{BackupConfig, BackupOrchestrator};
use mariadb_operator::controller::{Context, Event, Reconciler, Role};
use mariadb_operator::exec::TokioRunner;
use mariadb_operator::platform::{HookTools, PebbleCli};
use mariadb_operator::state::StateStore;
use mariadb_operator::{Actions, config};

/// Bound on hook-tool invocations; lifecycle handlers must not hang on the
/// platform CLI.
const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "mariadb-operator",
    about = "Lifecycle agent for a single-instance MariaDB workload"
)]
struct Cli {
    /// Persisted unit state file
    #[arg(long, default_value = "/var/lib/mariadb-operator/state.json")]
    state_file: PathBuf,

    /// Backup store directory
    #[arg(long, default_value = "/var/lib/mariadb-operator/backups")]
    backup_dir: PathBuf,

    /// Bound (seconds) on backup/restore tool invocations
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one lifecycle event delivered by the platform
    Dispatch {
        /// Event name (workload-ready, config-changed, update-status,
        /// peer-relation-changed, database-relation-changed)
        event: String,

        /// Relation id, for relation events
        #[arg(long)]
        relation_id: Option<u32>,
    },
    /// Run an operator action
    Action {
        /// Action name (restart, backup, list-backups, restore)
        name: String,

        /// Backup identifier, for restore
        #[arg(long)]
        backup_id: Option<String>,
    },
}

fn parse_event(name: &str, relation_id: Option<u32>) -> Result<Event, String> {
    match name {
        "workload-ready" | "mariadb-pebble-ready" => Ok(Event::WorkloadReady),
        "config-changed" => Ok(Event::ConfigChanged),
        "update-status" => Ok(Event::UpdateStatus),
        "peer-relation-changed" => Ok(Event::PeerRelationChanged),
        "database-relation-changed" => Ok(Event::ConsumerRelationChanged {
            relation_id: relation_id.ok_or("database-relation-changed requires --relation-id")?,
        }),
        other => Err(format!("unknown lifecycle event {other:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mariadb_operator=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let tool_timeout = Duration::from_secs(cli.timeout_secs);

    let runner = Arc::new(TokioRunner);
    let hook = Arc::new(HookTools::new(runner.clone(), HOOK_TIMEOUT));

    let store = StateStore::new(&cli.state_file);
    let state = store.load()?;

    let mariadb_config = match hook.config().await {
        Ok(config) => config,
        Err(e) => {
            warn!("cannot read configuration, using defaults: {e}");
            mariadb_operator::MariadbConfig::default()
        }
    };
    let port = mariadb_config
        .validated_port()
        .unwrap_or(config::DEFAULT_PORT as u16);

    let layer_dir = cli
        .state_file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let workload = Arc::new(PebbleCli::new(runner.clone(), layer_dir, HOOK_TIMEOUT));

    match cli.command {
        Command::Dispatch { event, relation_id } => {
            let event = parse_event(&event, relation_id)?;
            let role = if hook.is_leader().await? {
                Role::Leader
            } else {
                Role::Follower
            };

            let ctx = Context {
                workload,
                image: hook.clone(),
                relations: hook.clone(),
                status: hook.clone(),
            };

            let mut reconciler = Reconciler::new(ctx, mariadb_config, state, store);
            let status = reconciler.handle_event(event, role).await;
            info!(%status, "event handled");
        }
        Command::Action { name, backup_id } => {
            let backups = BackupOrchestrator::new(
                BackupConfig {
                    dir: cli.backup_dir,
                    host: "127.0.0.1".to_string(),
                    port,
                    timeout: tool_timeout,
                },
                runner.clone(),
            );
            let actions = Actions::new(workload, hook.clone(), backups);

            let outcome = match name.as_str() {
                "restart" => actions.restart().await,
                "backup" => actions.backup(state.root_password()).await,
                "list-backups" => actions.list_backups().await,
                "restore" => {
                    actions
                        .restore(backup_id.as_deref(), state.root_password())
                        .await
                }
                other => return Err(format!("unknown action {other:?}").into()),
            };

            for (key, value) in &outcome.results {
                hook.action_set(key, value).await?;
            }
            if let Some(reason) = &outcome.fail {
                hook.action_fail(reason).await?;
                info!(action = %name, reason = %reason, "action failed");
            } else {
                info!(action = %name, "action completed");
            }
        }
    }

    Ok(())
}
