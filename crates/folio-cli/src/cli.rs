//! CLI argument parsing and command definitions.
//!
//! Arguments that take free text or JSON (`--analysis`, `--content`,
//! `--notes`) also accept `@path` to read the value from a file.

use clap::{Args, Parser, Subcommand};
use folio_review::ArticleIdentity;
use uuid::Uuid;

// ============================================================================
// CLI argument types
// ============================================================================

/// Folio: feedback-driven retrieval for article analysis.
#[derive(Parser, Debug)]
#[command(name = "folio", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "FOLIO_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Editorial critiques and their versions.
    Critique(CritiqueCommand),

    /// Feedback on analyses, re-analysis and approval.
    Feedback(FeedbackCommand),

    /// The knowledge library of analytical frameworks.
    Knowledge(KnowledgeCommand),

    /// Retrieve prior critiques and approved analyses for a query.
    Retrieve {
        /// Query text.
        query: String,

        /// Number of results per collection.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Base prompt to augment with the retrieved context.
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Show provider configuration and corpus counts.
    Status,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Identifies an article by id or URL.
#[derive(Args, Debug, Clone, Default)]
pub struct ArticleArgs {
    /// Numeric article id.
    #[arg(long = "news-id")]
    pub news_id: Option<i64>,

    /// Article URL.
    #[arg(long)]
    pub url: Option<String>,
}

impl ArticleArgs {
    /// The article identity these flags describe.
    pub fn identity(&self) -> ArticleIdentity {
        ArticleIdentity {
            article_id: self.news_id,
            article_url: self.url.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Critiques
// ----------------------------------------------------------------------------

/// Critique subcommands.
#[derive(Parser, Debug)]
pub struct CritiqueCommand {
    /// Critique subcommand to execute.
    #[command(subcommand)]
    pub command: CritiqueAction,
}

/// Available critique subcommands.
#[derive(Subcommand, Debug)]
pub enum CritiqueAction {
    /// Record the first version of a critique.
    Create {
        /// Critique text.
        text: String,

        /// Article the critique is about.
        #[command(flatten)]
        article: ArticleArgs,

        /// Article headline.
        #[arg(long)]
        title: Option<String>,

        /// Classification (defaults to "general").
        #[arg(short = 't', long = "type")]
        critique_type: Option<String>,

        /// Editor notes: JSON, plain text, or @file.
        #[arg(long)]
        notes: Option<String>,
    },

    /// Record a new version of an existing critique.
    Revise {
        /// Id of the version being revised.
        parent_id: Uuid,

        /// Revised critique text.
        text: String,

        /// Classification (defaults to "general").
        #[arg(short = 't', long = "type")]
        critique_type: Option<String>,

        /// Editor notes: JSON, plain text, or @file.
        #[arg(long)]
        notes: Option<String>,
    },

    /// List every version in the chain containing a critique.
    Versions {
        /// Any critique id in the chain.
        id: Uuid,
    },

    /// List critiques for an article.
    List {
        /// Article to list.
        #[command(flatten)]
        article: ArticleArgs,
    },
}

// ----------------------------------------------------------------------------
// Feedback
// ----------------------------------------------------------------------------

/// Feedback subcommands.
#[derive(Parser, Debug)]
pub struct FeedbackCommand {
    /// Feedback subcommand to execute.
    #[command(subcommand)]
    pub command: FeedbackAction,
}

/// Arguments shared by `feedback submit` and `feedback revise`.
#[derive(Args, Debug, Clone)]
pub struct FeedbackArgs {
    /// Article the analysis is about.
    #[command(flatten)]
    pub article: ArticleArgs,

    /// Editor comment.
    #[arg(short = 'm', long)]
    pub comment: String,

    /// Score from 1 to 10.
    #[arg(short, long)]
    pub score: Option<u8>,

    /// The analysis as a JSON object, or @file.
    #[arg(short, long)]
    pub analysis: String,
}

/// Available feedback subcommands.
#[derive(Subcommand, Debug)]
pub enum FeedbackAction {
    /// Record feedback without re-analysis.
    Submit(FeedbackArgs),

    /// Record feedback and request a revised analysis.
    Revise(FeedbackArgs),

    /// Approve an entry and promote its analysis to the corpus.
    Approve {
        /// Feedback entry id.
        id: Uuid,

        /// Final analysis as a JSON object, or @file.
        #[arg(short, long)]
        analysis: String,
    },

    /// List an article's feedback entries in revision order.
    History {
        /// Article to list.
        #[command(flatten)]
        article: ArticleArgs,
    },
}

// ----------------------------------------------------------------------------
// Knowledge
// ----------------------------------------------------------------------------

/// Knowledge library subcommands.
#[derive(Parser, Debug)]
pub struct KnowledgeCommand {
    /// Knowledge subcommand to execute.
    #[command(subcommand)]
    pub command: KnowledgeAction,
}

/// Available knowledge subcommands.
#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Add a framework.
    Add {
        /// Category (ir_theory, geopolitics, economics, history, security, or any tag).
        #[arg(long)]
        category: String,

        /// Framework name.
        #[arg(short, long)]
        name: String,

        /// Display title.
        #[arg(short, long)]
        title: String,

        /// Body text, or @file.
        #[arg(long)]
        content: String,

        /// Keyword; repeat for several.
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,

        /// Citation or origin.
        #[arg(long)]
        source: Option<String>,
    },

    /// List frameworks, newest first.
    List {
        /// Only this category.
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a framework entry.
    Delete {
        /// Entry id.
        id: Uuid,
    },

    /// Search frameworks by similarity.
    Search {
        /// Query text.
        query: String,

        /// Number of results.
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Only this category.
        #[arg(long)]
        category: Option<String>,
    },
}

// ----------------------------------------------------------------------------
// Config
// ----------------------------------------------------------------------------

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration with credentials masked.
    Show {
        /// Print as FOLIO_* environment variables instead of TOML.
        #[arg(long)]
        env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use folio_review::ArticleKey;

    #[test]
    fn test_cli_args_global_flags() {
        let args = CliArgs::parse_from(["folio", "-v", "-c", "/tmp/f.toml", "status"]);
        assert!(args.verbose);
        assert!(!args.quiet);
        assert_eq!(args.config.as_deref(), Some("/tmp/f.toml"));
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(CliArgs::try_parse_from(["folio"]).is_err());
    }

    #[test]
    fn test_critique_create() {
        let args = CliArgs::parse_from([
            "folio", "critique", "create", "Too alarmist.", "--news-id", "42", "-t", "tone",
        ]);
        match args.command {
            Command::Critique(CritiqueCommand {
                command:
                    CritiqueAction::Create {
                        text,
                        article,
                        critique_type,
                        notes,
                        ..
                    },
            }) => {
                assert_eq!(text, "Too alarmist.");
                assert_eq!(article.identity().key().unwrap(), ArticleKey::Id(42));
                assert_eq!(critique_type.as_deref(), Some("tone"));
                assert!(notes.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_critique_revise_requires_uuid() {
        assert!(CliArgs::try_parse_from(["folio", "critique", "revise", "nope", "text"]).is_err());

        let id = Uuid::new_v4().to_string();
        let args = CliArgs::parse_from(["folio", "critique", "revise", &id, "better"]);
        assert!(matches!(
            args.command,
            Command::Critique(CritiqueCommand {
                command: CritiqueAction::Revise { .. }
            })
        ));
    }

    #[test]
    fn test_feedback_revise() {
        let args = CliArgs::parse_from([
            "folio",
            "feedback",
            "revise",
            "--url",
            "https://example.com/a",
            "-m",
            "More context",
            "-s",
            "6",
            "-a",
            "@analysis.json",
        ]);
        match args.command {
            Command::Feedback(FeedbackCommand {
                command: FeedbackAction::Revise(fb),
            }) => {
                assert_eq!(fb.comment, "More context");
                assert_eq!(fb.score, Some(6));
                assert_eq!(fb.analysis, "@analysis.json");
                assert_eq!(fb.article.url.as_deref(), Some("https://example.com/a"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_knowledge_add_repeated_keywords() {
        let args = CliArgs::parse_from([
            "folio", "knowledge", "add", "--category", "ir_theory", "-n", "realism", "-t",
            "Realism", "--content", "Anarchy.", "-k", "anarchy", "-k", "power",
        ]);
        match args.command {
            Command::Knowledge(KnowledgeCommand {
                command: KnowledgeAction::Add { keywords, .. },
            }) => assert_eq!(keywords, vec!["anarchy", "power"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_retrieve_options() {
        let args = CliArgs::parse_from(["folio", "retrieve", "sanctions", "-k", "3", "-p", "Base"]);
        match args.command {
            Command::Retrieve {
                query,
                top_k,
                prompt,
            } => {
                assert_eq!(query, "sanctions");
                assert_eq!(top_k, Some(3));
                assert_eq!(prompt.as_deref(), Some("Base"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_config_init() {
        let args = CliArgs::parse_from(["folio", "config", "init", "--file", "/tmp/x.toml", "--force"]);
        match args.command {
            Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            }) => {
                assert_eq!(file.as_deref(), Some("/tmp/x.toml"));
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_article_args_empty_identity() {
        assert!(ArticleArgs::default().identity().key().is_err());
    }
}
