//! Command-line interface module for pathtidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Rules file resolution and compilation
//! - Reordering orchestration
//! - Pruning of entries that are not directories on disk
//! - Emission of the final `export PATH="..."` line

use crate::config::{RuleConfig, RuleSet};
use crate::output::OutputFormatter;
use crate::reorder::PathReorderer;
use clap::Parser;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs};

/// Reorder, deduplicate and prune the PATH environment variable.
///
/// Reads `$PATH`, regroups its entries according to the priority rules in
/// the rules file, and prints a single `export PATH="..."` line intended to
/// be evaluated by the shell, e.g. `eval "$(pathtidy)"`.
#[derive(Parser, Debug)]
#[command(name = "pathtidy", version)]
pub struct Cli {
    /// Rules file to use instead of $PATHTIDY_CONFIG / ~/.pathtidy.toml.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a per-tag classification summary to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep entries that do not exist as directories on disk.
    #[arg(long)]
    pub keep_missing: bool,
}

/// Runs the CLI application.
///
/// This is the main entry point: it reads `$PATH` and the process
/// environment, loads and compiles the rules, reorders the entries, prunes
/// nonexistent directories, and prints the `export` line on stdout. All
/// diagnostics go to stderr.
///
/// # Errors
///
/// Returns an error if `$PATH` is unset or empty, or if the rules file
/// cannot be loaded or compiled. The caller decides whether that is fatal.
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let raw_path = env::var("PATH").unwrap_or_default();
    if raw_path.is_empty() {
        return Err("PATH was not set or is empty".to_string());
    }

    let env_map: HashMap<String, String> = env::vars().collect();

    let config = RuleConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let rules = config
        .compile(&env_map)
        .map_err(|e| format!("Error compiling rules: {}", e))?;

    for warning in rules.warnings() {
        OutputFormatter::warning(warning);
    }

    let reordered = PathReorderer::reorder(&rules, &raw_path);

    let entries = if cli.keep_missing {
        reordered
    } else {
        prune_missing_dirs(&reordered)
    };

    if cli.verbose {
        let rows = classification_summary(&rules, &entries);
        OutputFormatter::summary_table(&rows, entries.len());
    }

    println!("export PATH=\"{}\"", entries.join(":"));

    Ok(())
}

/// Keeps only the entries that exist as directories on disk.
///
/// Entries that do not exist are dropped silently; a stat failure for any
/// other reason is warned about on stderr and the entry is dropped as well.
pub fn prune_missing_dirs(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| match fs::metadata(entry) {
            Ok(metadata) => metadata.is_dir(),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => {
                OutputFormatter::warning(&format!("could not stat path {}", entry));
                false
            }
        })
        .cloned()
        .collect()
}

/// Counts the final entries per tag, in bucket-priority order, with the
/// unclassified count as the last row.
fn classification_summary(rules: &RuleSet, entries: &[String]) -> Vec<(String, usize)> {
    let mut rows: Vec<(String, usize)> =
        rules.order().iter().map(|tag| (tag.clone(), 0)).collect();
    let mut unclassified = 0;

    for entry in entries {
        match rules.classify(entry) {
            Some(tag) => {
                if let Some(position) = rules.order().iter().position(|t| t == tag) {
                    rows[position].1 += 1;
                }
            }
            None => unclassified += 1,
        }
    }

    rows.push(("(unclassified)".to_string(), unclassified));
    rows
}
