//! Output formatting helpers.

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use leadflow_core::Record;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn status_label(status: &str) -> ColoredString {
    match status {
        "new" | "open" => status.cyan(),
        "bought" | "resolved" | "closed" => status.green(),
        "lost" => status.red(),
        _ => status.yellow(),
    }
}

/// Print one record as a single human-readable row.
pub fn record_row(record: &Record) {
    let title = ["title", "name", "email"]
        .iter()
        .find_map(|f| record.text_field(f))
        .unwrap_or_default();
    let assignee = record
        .assigned_to
        .as_ref()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{}  {}  {}  {}",
        record.id.as_str().dimmed(),
        status_label(record.status.as_str()),
        title,
        assignee.dimmed()
    );
}
