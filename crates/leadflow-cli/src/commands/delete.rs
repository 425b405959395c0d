//! Delete record command implementation.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Args;

use leadflow_core::workflow::Preconfirmed;
use leadflow_core::{Confirm, DeleteOutcome, RecordId, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Asks on stderr and reads the answer from stdin. Anything other than
/// `y` (including EOF or a read error) declines.
struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        if io::stderr().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => is_yes(&input),
            Err(_) => false,
        }
    }
}

fn is_yes(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("y") || input.eq_ignore_ascii_case("yes")
}

pub async fn run(args: DeleteArgs, store: Option<&str>) -> Result<()> {
    let workflow = profile::workflow(store, &args.collection, WorkflowConfig::default())?;
    let id = RecordId::new(&args.id).context("Invalid record id")?;

    let outcome = if args.yes {
        workflow.delete_record(&id, &Preconfirmed).await
    } else {
        workflow.delete_record(&id, &StdinPrompt).await
    }
    .context("Failed to delete record")?;

    match outcome {
        DeleteOutcome::Deleted => output::success(&format!("Record {} deleted", id)),
        DeleteOutcome::Cancelled => eprintln!("Aborted."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
