use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use repobridge::config::LoggingConfig;
use repobridge::permissions::{register_actions, ActionRegistry, ACTIONS};
use repobridge::reconcile::{AlertVariant, Reconciler};
use repobridge::service::{CredentialSource, HttpProjectService, ProjectService, Repository};
use repobridge::{tui, Config};

#[derive(Parser)]
#[command(name = "repobridge")]
#[command(about = "Browse GitHub repositories and manage their project entries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories and their project links
    List {
        /// Show repository details
        #[arg(long)]
        details: bool,
    },

    /// Create project entries for repositories
    Create {
        /// Repository ids to create projects for
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete the project entries linked to repositories
    Delete {
        /// Repository ids whose projects should be deleted
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Manage the project service credential
    Auth {
        #[command(subcommand)]
        auth_command: AuthCommands,
    },

    /// Show registered actions and their grant state
    Actions,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Show which credential source would be used
    Status,

    /// Call the project service with the current credential
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config)?;

    // Only initialize logging for CLI commands, not TUI
    // TUI has its own status line and stdout logging breaks raw mode
    let is_tui = cli.command.is_none();
    if !is_tui {
        init_logging(cli.verbose, &config.logging);
        info!("Starting RepoBridge v{}", env!("CARGO_PKG_VERSION"));
    }

    // Register the action descriptors once at startup
    let registry = Arc::new(ActionRegistry::new(&config.permissions.granted));
    register_actions(registry.as_ref()).await?;

    // Execute command (default to TUI if no command specified)
    match cli.command {
        None => cmd_tui(&config, &registry).await,
        Some(Commands::List { details }) => cmd_list(details, &config, &registry).await,
        Some(Commands::Create { ids }) => cmd_create(ids, &config, &registry).await,
        Some(Commands::Delete { ids }) => cmd_delete(ids, &config, &registry).await,
        Some(Commands::Auth { auth_command }) => cmd_auth(auth_command, &config).await,
        Some(Commands::Actions) => cmd_actions(&registry),
    }
}

/// Initialize logging based on verbosity and the logging config section
fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let default_directive = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(logging.color);

    match logging.format.as_str() {
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Require a granted action or abort the command
fn require_action(registry: &ActionRegistry, uid: &str) -> Result<()> {
    if registry.is_granted(uid) {
        Ok(())
    } else {
        Err(anyhow!(
            "Action \"{}\" is not granted. Check permissions.granted in the configuration.",
            uid
        ))
    }
}

/// Launch the interactive console
async fn cmd_tui(config: &Config, registry: &ActionRegistry) -> Result<()> {
    // Preflight - the console is useless without read access
    for uid in ["use", "repos.read"] {
        if !registry.is_granted(uid) {
            println!("❌ Cannot start the console - action \"{}\" is not granted", uid);
            println!("   Check permissions.granted in the configuration");
            std::process::exit(1);
        }
    }

    tui::run_tui(config.clone()).await
}

/// List repositories and their project links
async fn cmd_list(details: bool, config: &Config, registry: &ActionRegistry) -> Result<()> {
    require_action(registry, "repos.read")?;

    let service = HttpProjectService::new(config)?;
    let repos = service.fetch_repositories().await?;

    println!("Repositories ({}):", repos.len());

    for repo in &repos {
        let marker = if repo.is_linked() { "🔗" } else { "  " };
        println!("  {} {} {}", marker, repo.id, repo.name);

        if details {
            if !repo.short_description.is_empty() {
                println!("       📝 {}", repo.short_description);
            }
            println!("       🌐 {}", repo.url);
            if let Some(project_id) = &repo.project_id {
                println!("       📦 project {}", project_id);
            }
            println!();
        }
    }

    Ok(())
}

/// Create project entries for the given repository ids
async fn cmd_create(ids: Vec<String>, config: &Config, registry: &ActionRegistry) -> Result<()> {
    require_action(registry, "projects.create")?;

    let service: Arc<dyn ProjectService> = Arc::new(HttpProjectService::new(config)?);
    let mut reconciler = Reconciler::new(service.clone());
    reconciler.set_repos(service.fetch_repositories().await?);

    let targets = resolve_repositories(&reconciler, &ids)?;

    let unlinked: Vec<Repository> = targets
        .iter()
        .filter(|repo| !repo.is_linked())
        .cloned()
        .collect();

    for repo in targets.iter().filter(|repo| repo.is_linked()) {
        println!("⏭️  {} already has a project, skipping", repo.name);
    }

    if unlinked.is_empty() {
        println!("Nothing to create");
        return Ok(());
    }

    if let [repo] = unlinked.as_slice() {
        let repo = repo.clone();
        reconciler.create_single(repo).await;
    } else {
        reconciler.create_many(unlinked).await;
    }

    report_outcome(&reconciler)
}

/// Delete the project entries linked to the given repository ids
async fn cmd_delete(ids: Vec<String>, config: &Config, registry: &ActionRegistry) -> Result<()> {
    require_action(registry, "projects.delete")?;

    let service: Arc<dyn ProjectService> = Arc::new(HttpProjectService::new(config)?);
    let mut reconciler = Reconciler::new(service.clone());
    reconciler.set_repos(service.fetch_repositories().await?);

    let targets = resolve_repositories(&reconciler, &ids)?;

    let linked: Vec<Repository> = targets
        .iter()
        .filter(|repo| repo.is_linked())
        .cloned()
        .collect();

    for repo in targets.iter().filter(|repo| !repo.is_linked()) {
        println!("⏭️  {} has no project, skipping", repo.name);
    }

    if linked.is_empty() {
        println!("Nothing to delete");
        return Ok(());
    }

    if let [repo] = linked.as_slice() {
        let repo = repo.clone();
        reconciler.delete_single(repo).await;
    } else {
        let project_ids = linked
            .iter()
            .filter_map(|repo| repo.project_id.clone())
            .collect();
        reconciler.delete_many(project_ids).await;
    }

    report_outcome(&reconciler)
}

/// Handle credential commands
async fn cmd_auth(auth_command: AuthCommands, config: &Config) -> Result<()> {
    let service = HttpProjectService::new(config)?;

    match auth_command {
        AuthCommands::Status => match service.bearer_token() {
            Ok((source, _)) => {
                let source = match source {
                    CredentialSource::Inline => "inline configuration token",
                    CredentialSource::Environment => "environment variable",
                    CredentialSource::TokenFile => "token file",
                };
                println!("✅ Credential available");
                println!("   Source: {}", source);
            }
            Err(err) => {
                println!("❌ No credential available: {:#}", err);
            }
        },
        AuthCommands::Test => {
            println!("🔍 Testing project service access...");

            match service.fetch_repositories().await {
                Ok(repos) => {
                    let linked = repos.iter().filter(|repo| repo.is_linked()).count();
                    println!("✅ Project service reachable");
                    println!("   Repositories: {} ({} linked)", repos.len(), linked);
                }
                Err(err) => {
                    println!("❌ Project service call failed: {:#}", err);
                    println!();
                    println!("To fix this, run: repobridge auth status");
                }
            }
        }
    }

    Ok(())
}

/// Show the registered action descriptors and their grant state
fn cmd_actions(registry: &ActionRegistry) -> Result<()> {
    println!("Registered actions:");

    for action in &ACTIONS {
        let icon = if registry.is_granted(action.uid) {
            "✅"
        } else {
            "⛔"
        };
        let category = action.sub_category.unwrap_or("-");
        println!(
            "  {} {:<18} {:<14} {}",
            icon, action.uid, category, action.display_name
        );
    }

    Ok(())
}

/// Map repository ids to catalogue entries, rejecting unknown ids
fn resolve_repositories(reconciler: &Reconciler, ids: &[String]) -> Result<Vec<Repository>> {
    ids.iter()
        .map(|id| {
            reconciler
                .repos()
                .iter()
                .find(|repo| &repo.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("Unknown repository id: {}", id))
        })
        .collect()
}

/// Print the operation alert and exit non-zero on failure
fn report_outcome(reconciler: &Reconciler) -> Result<()> {
    if let Some(alert) = reconciler.alert() {
        match alert.variant {
            AlertVariant::Success => {
                println!("✅ {}: {}", alert.title, alert.message);
            }
            AlertVariant::Danger => {
                println!("❌ {}: {}", alert.title, alert.message);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
