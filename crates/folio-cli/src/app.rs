//! The Folio CLI application.

use crate::cli::{CliArgs, Command};
use crate::commands;
use crate::config::FolioConfig;
use crate::config_handlers;
use crate::lock::{LockMode, with_data_dir_lock};
use crate::services::Services;
use folio_core::Result;
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ============================================================================
// FolioCli
// ============================================================================

/// One CLI invocation: loaded config plus the command dispatcher.
#[derive(Debug)]
pub struct FolioCli {
    config: FolioConfig,
}

impl FolioCli {
    /// Create from CLI args, loading config from file and env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Ok(Self::new(FolioConfig::load(args.config.as_deref())?))
    }

    /// Create over an already loaded config.
    pub fn new(config: FolioConfig) -> Self {
        Self { config }
    }

    /// The loaded config.
    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run `args.command`, printing its JSON result to stdout.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        Self::init_logging(args.verbose, args.quiet);

        if let Command::Config(config_cmd) = args.command {
            return config_handlers::handle_config_command(
                args.config.as_deref(),
                config_cmd.command,
            );
        }

        let data_dir = self.config.data_dir()?;
        let mode = if is_mutating(&args.command) {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        };
        let wait = Duration::from_secs(self.config.store.lock_timeout_secs);
        let command = args.command;
        let output = with_data_dir_lock(&data_dir, mode, wait, || async move {
            let services = Services::open(&self.config).await?;
            dispatch(&services, command).await
        })
        .await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// Run a service command, saving the snapshots when it changed state.
pub async fn dispatch(services: &Services, command: Command) -> Result<Value> {
    let mutating = is_mutating(&command);
    let output = match command {
        Command::Critique(cmd) => commands::handle_critique(services, cmd.command).await?,
        Command::Feedback(cmd) => commands::handle_feedback(services, cmd.command).await?,
        Command::Knowledge(cmd) => commands::handle_knowledge(services, cmd.command).await?,
        Command::Retrieve {
            query,
            top_k,
            prompt,
        } => commands::handle_retrieve(services, &query, top_k, prompt.as_deref()).await?,
        Command::Status => commands::handle_status(services).await?,
        Command::Config(_) => {
            return Err(folio_core::Error::operation(
                "config commands run without services",
            ));
        }
    };
    if mutating {
        services.save().await?;
    }
    Ok(output)
}

/// Whether `command` writes records or corpus documents.
pub fn is_mutating(command: &Command) -> bool {
    use crate::cli::{CritiqueAction, FeedbackAction, KnowledgeAction};

    match command {
        Command::Critique(cmd) => matches!(
            cmd.command,
            CritiqueAction::Create { .. } | CritiqueAction::Revise { .. }
        ),
        Command::Feedback(cmd) => !matches!(cmd.command, FeedbackAction::History { .. }),
        Command::Knowledge(cmd) => matches!(
            cmd.command,
            KnowledgeAction::Add { .. } | KnowledgeAction::Delete { .. }
        ),
        Command::Retrieve { .. } | Command::Status | Command::Config(_) => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
