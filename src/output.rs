//! Output formatting and styling module.
//!
//! Provides a centralized interface for all diagnostic output. Everything
//! here writes to **stderr**: standard output carries only the final
//! `export PATH="..."` line, so the command stays safe to `eval` from a
//! shell startup file.

use colored::*;

/// Manages diagnostic output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - The `--verbose` classification summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        eprintln!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        eprintln!("\n{}", header.bold());
    }

    /// Prints the per-tag classification summary used by `--verbose`.
    ///
    /// `rows` holds (tag, entry count) pairs already in bucket-priority
    /// order, with the unclassified count as its final row.
    pub fn summary_table(rows: &[(String, usize)], total: usize) {
        Self::header("CLASSIFICATION");

        let max_tag_len = rows
            .iter()
            .map(|(tag, _)| tag.len())
            .max()
            .unwrap_or(0)
            .max(3); // At least "Tag" width

        eprintln!(
            "{:<width$} | {}",
            "Tag".bold(),
            "Entries".bold(),
            width = max_tag_len
        );
        eprintln!("{}", "-".repeat(max_tag_len + 10));

        for (tag, count) in rows {
            let entry_word = if *count == 1 { "entry" } else { "entries" };
            eprintln!(
                "{:<width$} | {} {}",
                tag,
                count.to_string().green(),
                entry_word,
                width = max_tag_len
            );
        }

        eprintln!("{}", "-".repeat(max_tag_len + 10));
        eprintln!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "entry" } else { "entries" },
            width = max_tag_len
        );
    }
}
