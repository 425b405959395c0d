//! List records command implementation.
//!
//! Opens the live query, takes its first snapshot, and prints the records
//! that pass the client filter as one JSON object per line.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures_util::StreamExt;

use leadflow_core::{ActorId, FieldFilter, Query, StatusFilter, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Collection name
    pub collection: String,

    /// Case-insensitive search over the record's text fields
    #[arg(long, default_value = "")]
    pub search: String,

    /// Status to show, or "all"
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Only records assigned to this actor (within your own scope)
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: ListArgs, store: Option<&str>) -> Result<()> {
    let workflow = profile::workflow(store, &args.collection, WorkflowConfig::default())?;
    let status: StatusFilter = args.status.parse().context("Invalid status filter")?;

    let mut query = Query::all();
    if let Some(actor) = &args.assigned_to {
        let actor = ActorId::new(actor).context("Invalid assignee")?;
        query = query.filter(FieldFilter::eq("assignedTo", actor.as_str()));
    }

    let mut subscription = workflow
        .subscribe(query)
        .await
        .context("Failed to open live query")?;

    let snapshot = subscription
        .next()
        .await
        .context("Live query ended before the first snapshot")?
        .context("Failed to read records")?;
    subscription.unsubscribe();

    let records = workflow.apply_client_filter(&snapshot.records, &args.search, &status);

    if records.is_empty() {
        eprintln!("{}", "No records found.".dimmed());
        return Ok(());
    }

    for record in &records {
        if args.pretty {
            output::json_pretty(record)?;
        } else {
            output::json(record)?;
        }
    }

    Ok(())
}
