//! CLI command definitions and handlers

use crate::cache::RevisionModelCache;
use crate::config::{load_config, TrackConfig};
use crate::git::GitRepository;
use crate::history::History;
use crate::parsers;
use crate::track::{
    AttributeOptions, AttributeTracker, BlockOptions, BlockTracker, ClassOptions, ClassTracker,
    MethodOptions, MethodTracker, VariableOptions, VariableTracker,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// codetrail - reconstruct the change history of one code element
#[derive(Parser, Debug)]
#[command(name = "codetrail")]
#[command(
    version,
    about = "Walks a git history backward from one class, method, attribute, variable, or block, \
classifying every change it went through (rename, signature change, move, extraction, ...)",
    after_help = "\
Examples:
  codetrail method --file src/Calculator.java --name add --line 42
  codetrail class --file src/Calculator.java --name Calculator --format json
  codetrail block --file src/Parser.java --method parse --start-line 80 --end-line 95"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to the repository (or any subdirectory)
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Starting commit: hash, branch, or HEAD
    #[arg(long, default_value = "HEAD")]
    pub start: String,

    /// File path within the repository
    #[arg(long)]
    pub file: String,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Match threshold in [0,1]; overrides codetrail.toml
    #[arg(long)]
    pub tau: Option<f64>,

    /// Maximum commits visited across all branches; overrides codetrail.toml
    #[arg(long)]
    pub max_commits: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a method's history
    Method {
        #[command(flatten)]
        common: CommonArgs,
        /// Method name
        #[arg(long)]
        name: String,
        /// Line of the method declaration (disambiguates overloads)
        #[arg(long)]
        line: u32,
    },
    /// Track a class's history
    Class {
        #[command(flatten)]
        common: CommonArgs,
        /// Simple or dotted nested class name
        #[arg(long)]
        name: String,
    },
    /// Track an attribute (field) of a class
    Attribute {
        #[command(flatten)]
        common: CommonArgs,
        /// Attribute name
        #[arg(long)]
        name: String,
        /// Line of the attribute declaration
        #[arg(long)]
        line: u32,
    },
    /// Track a local variable inside a method
    Variable {
        #[command(flatten)]
        common: CommonArgs,
        /// Variable name
        #[arg(long)]
        name: String,
        /// Simple name of the enclosing method
        #[arg(long)]
        method: String,
        /// Line of the variable declaration
        #[arg(long)]
        line: u32,
    },
    /// Track a statement block (for, if, try, ...) inside a method
    Block {
        #[command(flatten)]
        common: CommonArgs,
        /// Simple name of the enclosing method
        #[arg(long)]
        method: String,
        #[arg(long)]
        start_line: u32,
        #[arg(long)]
        end_line: u32,
    },
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Commands::Method { common, .. }
            | Commands::Class { common, .. }
            | Commands::Attribute { common, .. }
            | Commands::Variable { common, .. }
            | Commands::Block { common, .. } => common,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let common = cli.command.common();

    let repo = GitRepository::discover(&common.repo)
        .with_context(|| format!("failed to open repository at {}", common.repo.display()))?;
    let repo: Arc<dyn crate::git::RepositoryAccess> = Arc::new(repo);

    let Some(builder) = parsers::builder_for_path(&common.file) else {
        bail!("no language front end for '{}'", common.file);
    };
    let cache = Arc::new(RevisionModelCache::new(builder));

    let mut config = load_config(&common.repo)?;
    if let Some(tau) = common.tau {
        config.tau = tau;
    }
    if let Some(max_commits) = common.max_commits {
        config.max_commits = max_commits;
    }

    let format = common.format.clone();
    let history = with_spinner(|| track(&cli.command, repo, cache, config))?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&history.to_report())?);
        }
        _ => print_text(&history),
    }
    Ok(())
}

fn track(
    command: &Commands,
    repo: Arc<dyn crate::git::RepositoryAccess>,
    cache: Arc<RevisionModelCache>,
    config: TrackConfig,
) -> Result<History> {
    let history = match command {
        Commands::Method {
            common, name, line, ..
        } => MethodTracker::new(
            repo,
            cache,
            MethodOptions {
                start_commit: common.start.clone(),
                file_path: common.file.clone(),
                name: name.clone(),
                line: *line,
            },
            config,
        )?
        .track()?,
        Commands::Class { common, name } => ClassTracker::new(
            repo,
            cache,
            ClassOptions {
                start_commit: common.start.clone(),
                file_path: common.file.clone(),
                name: name.clone(),
            },
            config,
        )?
        .track()?,
        Commands::Attribute { common, name, line } => AttributeTracker::new(
            repo,
            cache,
            AttributeOptions {
                start_commit: common.start.clone(),
                file_path: common.file.clone(),
                name: name.clone(),
                line: *line,
            },
            config,
        )?
        .track()?,
        Commands::Variable {
            common,
            name,
            method,
            line,
        } => VariableTracker::new(
            repo,
            cache,
            VariableOptions {
                start_commit: common.start.clone(),
                file_path: common.file.clone(),
                name: name.clone(),
                method_name: method.clone(),
                line: *line,
            },
            config,
        )?
        .track()?,
        Commands::Block {
            common,
            method,
            start_line,
            end_line,
        } => BlockTracker::new(
            repo,
            cache,
            BlockOptions {
                start_commit: common.start.clone(),
                file_path: common.file.clone(),
                method_name: method.clone(),
                start_line: *start_line,
                end_line: *end_line,
            },
            config,
        )?
        .track()?,
    };
    Ok(history)
}

fn with_spinner<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("walking commit graph...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = f();
    spinner.finish_and_clear();
    result
}

fn print_text(history: &History) {
    let seed = history.node(history.seed());
    println!(
        "{} {} ({})",
        style("history of").bold(),
        style(&seed.qualified_name).cyan().bold(),
        seed.kind
    );
    println!(
        "  {} versions, {} changes{}",
        history.node_count(),
        history.edge_count(),
        if history.truncated() {
            " (truncated)"
        } else {
            ""
        }
    );
    println!();

    for (idx, node) in history.nodes() {
        println!(
            "{} {} {} {}",
            style(&node.commit.short_id).yellow(),
            node.commit.committed.format("%Y-%m-%d"),
            style(&node.commit.author).green(),
            node.commit.summary
        );
        println!(
            "    {} at {}:{}",
            node.qualified_name, node.path, node.range
        );
        for (to, edge) in history.edges_from(idx) {
            let earlier = history.node(to);
            println!(
                "    {} {} (score {:.2}) -> {}",
                style("\u{2514}").dim(),
                style(edge.kind).magenta(),
                edge.score,
                earlier.commit.short_id
            );
        }
    }

    if !history.terminals().is_empty() {
        println!();
        for (idx, reason) in history.terminals() {
            let node = history.node(*idx);
            println!(
                "{} {} at {}",
                style("terminal:").bold(),
                reason,
                node.commit.short_id
            );
        }
    }

    let summary = history.change_summary();
    if !summary.is_empty() {
        println!();
        let parts: Vec<String> = summary
            .iter()
            .map(|(kind, count)| format!("{kind}: {count}"))
            .collect();
        println!("{} {}", style("changes:").bold(), parts.join(", "));
    }
}
