//! CLI コマンド定義とハンドラ

use anyhow::Result;
use clap::{Parser, Subcommand};
use fukurow_el::{
    print_proof_tree, CancellationToken, ClassExpression, OwlIri, Reasoner, ReasonerConfig, TaxonomyNode,
    TracingMode,
};
use fukurow_owl::loader::{validate_expression, JsonOntologyLoader, OntologyLoader};
use fukurow_owl::model::vocabulary;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "fukurow-el")]
#[command(about = "OWL 2 EL saturation reasoner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Reasoner configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of saturation workers, overrides the configuration file
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Classify an ontology and print its taxonomy
    Classify {
        /// Ontology file (JSON)
        ontology: PathBuf,
    },

    /// Check the ontology for consistency and list unsatisfiable classes
    Consistency {
        /// Ontology file (JSON)
        ontology: PathBuf,
    },

    /// Explain an entailed subsumption with its proof
    Explain {
        /// Ontology file (JSON)
        ontology: PathBuf,

        /// Sub-class IRI
        #[arg(long)]
        sub: String,

        /// Super-class IRI
        #[arg(long)]
        sup: String,

        /// Follow premises into other contexts
        #[arg(short, long)]
        recursive: bool,
    },

    /// Find named classes equivalent to a class expression
    Equivalents {
        /// Ontology file (JSON)
        ontology: PathBuf,

        /// Class expression as JSON, e.g. {"Named":"http://example.org/A"}
        #[arg(short, long)]
        query: String,
    },

    /// Show system information
    Info,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
}

/// Errors in command input
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid query expression: {0}")]
    InvalidQuery(String),

    #[error("Worker count must be at least 1")]
    NoWorkers,
}

/// Command execution result
#[derive(Debug, Serialize)]
pub struct CommandResult {
    pub success: bool,
    /// Human-readable output
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    /// Render the result in the requested format
    ///
    /// JSON output is the command's data, or the whole result when there is none.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match (format, &self.data) {
            (OutputFormat::Text, _) => self.message.clone(),
            (OutputFormat::Json, Some(data)) => serde_json::to_string(data)?,
            (OutputFormat::JsonPretty, Some(data)) => serde_json::to_string_pretty(data)?,
            (OutputFormat::Json, None) => serde_json::to_string(self)?,
            (OutputFormat::JsonPretty, None) => serde_json::to_string_pretty(self)?,
        })
    }
}

/// Execute CLI commands
pub struct CommandExecutor {
    cancel: CancellationToken,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    /// Token that interrupts the running command's saturation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute a parsed command line and print its output
    pub async fn execute(&mut self, cli: Cli) -> Result<CommandResult> {
        let result = self.run(cli.command, cli.config, cli.workers).await?;
        println!("{}", result.render(cli.format)?);
        Ok(result)
    }

    /// Execute a command without printing
    pub async fn run(
        &mut self,
        command: Commands,
        config: Option<PathBuf>,
        workers: Option<usize>,
    ) -> Result<CommandResult> {
        if command == Commands::Info {
            return execute_info();
        }

        let config = load_config(config.as_deref(), workers)?;
        self.cancel.reset();
        let cancel = self.cancel.clone();

        // saturation blocks, keep it off the runtime threads
        tokio::task::spawn_blocking(move || match command {
            Commands::Classify { ontology } => execute_classify(&ontology, config, cancel),
            Commands::Consistency { ontology } => execute_consistency(&ontology, config, cancel),
            Commands::Explain {
                ontology,
                sub,
                sup,
                recursive,
            } => execute_explain(&ontology, config, cancel, &sub, &sup, recursive),
            Commands::Equivalents { ontology, query } => execute_equivalents(&ontology, config, cancel, &query),
            Commands::Info => execute_info(),
        })
        .await?
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn execute_info() -> Result<CommandResult> {
    let info = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "authors": env!("CARGO_PKG_AUTHORS"),
        "repository": env!("CARGO_PKG_REPOSITORY"),
        "features": ["owl2-el", "saturation", "taxonomy", "proof-tracing"]
    });

    Ok(CommandResult {
        success: true,
        message: serde_json::to_string_pretty(&info)?,
        data: Some(info),
    })
}

/// Configuration file (or defaults) with command-line overrides applied
pub fn load_config(path: Option<&Path>, workers: Option<usize>) -> Result<ReasonerConfig> {
    let mut config = match path {
        Some(path) => ReasonerConfig::from_path(path)?,
        None => ReasonerConfig::default(),
    };
    if let Some(workers) = workers {
        if workers == 0 {
            return Err(CommandError::NoWorkers.into());
        }
        config.saturation.num_workers = workers;
    }
    Ok(config)
}

fn load_reasoner(path: &Path, config: ReasonerConfig, cancel: CancellationToken) -> Result<Reasoner> {
    let ontology = JsonOntologyLoader.load_from_path(path)?;
    info!(
        path = %path.display(),
        axioms = ontology.axioms.len(),
        workers = config.saturation.num_workers,
        "loaded ontology"
    );
    Ok(Reasoner::new(ontology, config)?.with_cancellation_token(cancel))
}

fn node_label(node: &TaxonomyNode) -> String {
    if node.is_anonymous() {
        return "[anonymous]".to_string();
    }
    node.named_members()
        .iter()
        .map(OwlIri::short_form)
        .collect::<Vec<_>>()
        .join(" ≡ ")
}

fn execute_classify(path: &Path, config: ReasonerConfig, cancel: CancellationToken) -> Result<CommandResult> {
    let mut reasoner = load_reasoner(path, config, cancel)?;
    let taxonomy = reasoner.classify()?;

    let mut message = String::new();
    for node in taxonomy.nodes() {
        let supers: Vec<String> = node
            .direct_super_nodes()
            .iter()
            .filter_map(|&id| taxonomy.node(id))
            .map(node_label)
            .collect();
        if supers.is_empty() {
            writeln!(message, "{}", node_label(node))?;
        } else {
            writeln!(message, "{} ⊑ {}", node_label(node), supers.join(", "))?;
        }
    }
    let node_count = taxonomy.len();
    let nodes = serde_json::to_value(taxonomy.nodes())?;
    write!(message, "{} nodes", node_count)?;

    Ok(CommandResult {
        success: true,
        message,
        data: Some(json!({
            "nodes": nodes,
            "statistics": reasoner.statistics(),
        })),
    })
}

fn execute_consistency(path: &Path, config: ReasonerConfig, cancel: CancellationToken) -> Result<CommandResult> {
    let mut reasoner = load_reasoner(path, config, cancel)?;
    let consistent = reasoner.is_consistent()?;

    let unsatisfiable: Vec<OwlIri> = if consistent {
        reasoner
            .classify()?
            .bottom_node()
            .named_members()
            .iter()
            .filter(|iri| iri.as_str() != vocabulary::OWL_NOTHING)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let mut message = if consistent {
        "Ontology is consistent".to_string()
    } else {
        "Ontology is inconsistent".to_string()
    };
    if !unsatisfiable.is_empty() {
        write!(message, "\nUnsatisfiable classes:")?;
        for iri in &unsatisfiable {
            write!(message, "\n  {}", iri)?;
        }
    }

    Ok(CommandResult {
        success: true,
        message,
        data: Some(json!({
            "consistent": consistent,
            "unsatisfiable": unsatisfiable,
        })),
    })
}

fn execute_explain(
    path: &Path,
    config: ReasonerConfig,
    cancel: CancellationToken,
    sub: &str,
    sup: &str,
    recursive: bool,
) -> Result<CommandResult> {
    let mut reasoner = load_reasoner(path, config, cancel)?;
    let (sub, sup) = (OwlIri::new(sub), OwlIri::new(sup));

    if !reasoner.is_subsumed_by(&sub, &sup)? {
        return Ok(CommandResult {
            success: false,
            message: format!("{} ⊑ {} is not entailed", sub.short_form(), sup.short_form()),
            data: Some(json!({ "entailed": false })),
        });
    }

    let mode = if recursive {
        TracingMode::Recursive
    } else {
        TracingMode::NonRecursive
    };
    let graph = reasoner.subsumption_proof_with(&sub, &sup, mode)?;
    let state = reasoner.saturation_state()?;
    let index = state.index();

    let tree = print_proof_tree(&graph, index)?;
    let axioms: Vec<String> = graph
        .axioms(index)?
        .into_iter()
        .filter_map(|id| index.axiom(id))
        .map(ToString::to_string)
        .collect();
    let inferences: Vec<String> = graph
        .conclusions()
        .iter()
        .flat_map(|conclusion| graph.inferences(conclusion))
        .map(|inference| inference.labelled(index).to_string())
        .collect();

    let mut message = tree;
    if !axioms.is_empty() {
        write!(message, "\nAxioms used:")?;
        for axiom in &axioms {
            write!(message, "\n  {}", axiom)?;
        }
    }

    Ok(CommandResult {
        success: true,
        message,
        data: Some(json!({
            "entailed": true,
            "root": graph.root().labelled(index).to_string(),
            "mode": mode,
            "conclusions": graph.conclusions().len(),
            "inferences": inferences,
            "axioms": axioms,
        })),
    })
}

fn execute_equivalents(
    path: &Path,
    config: ReasonerConfig,
    cancel: CancellationToken,
    query: &str,
) -> Result<CommandResult> {
    let expression: ClassExpression =
        serde_json::from_str(query).map_err(|e| CommandError::InvalidQuery(e.to_string()))?;
    validate_expression(&expression)?;

    let mut reasoner = load_reasoner(path, config, cancel)?;
    let equivalents = reasoner.equivalent_classes(&expression)?;

    let message = if equivalents.is_empty() {
        format!("No named class is equivalent to {}", expression)
    } else {
        equivalents
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(CommandResult {
        success: true,
        message,
        data: Some(json!({
            "query": expression.to_string(),
            "equivalents": equivalents,
        })),
    })
}
