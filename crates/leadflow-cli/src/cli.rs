//! CLI argument definitions.

use clap::Parser;

use crate::commands::Commands;

/// Work with live, role-scoped lead and ticket collections.
#[derive(Parser, Debug)]
#[command(name = "leadflow")]
#[command(author, version = env!("LEADFLOW_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Store URL (file:///path or memory://), overriding the profile
    #[arg(long, env = "LEADFLOW_STORE", global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_store_after_subcommand() {
        let cli = Cli::try_parse_from([
            "leadflow",
            "profile",
            "set",
            "--store",
            "memory://",
            "--actor",
            "ops@example.com",
            "--role",
            "manager",
        ])
        .unwrap();
        assert_eq!(cli.store.as_deref(), Some("memory://"));
    }
}
