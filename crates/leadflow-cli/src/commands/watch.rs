//! Watch command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use leadflow_core::{ClientFilter, Query, Record, StatusFilter, ViewState, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Collection name
    pub collection: String,

    /// Case-insensitive search over the record's text fields
    #[arg(long, default_value = "")]
    pub search: String,

    /// Status to show, or "all"
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Output each update as one JSON line
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Update<'a> {
    revision: u64,
    total: usize,
    visible: &'a [Record],
}

pub async fn run(args: WatchArgs, store: Option<&str>) -> Result<()> {
    let workflow = profile::workflow(store, &args.collection, WorkflowConfig::default())?;
    let status: StatusFilter = args.status.parse().context("Invalid status filter")?;

    let mut view = workflow
        .live_view(Query::all(), ClientFilter::new(args.search.clone(), status))
        .await
        .context("Failed to open live query")?;

    if !args.json {
        eprintln!(
            "{}",
            format!("Watching {} as {}...", workflow.collection(), workflow.actor().id).dimmed()
        );
        eprintln!("{}", "Press Ctrl+C to stop.".dimmed());
        eprintln!();
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = view.next() => match update {
                Some(Ok(state)) => print_state(&state, args.json)?,
                // Keep following; the next snapshot may succeed.
                Some(Err(e)) => output::error(&format!("{} ({})", e.user_notice(), e)),
                None => break,
            },
        }
    }

    view.close();
    Ok(())
}

fn print_state(state: &ViewState, json: bool) -> Result<()> {
    if json {
        return output::json(&Update {
            revision: state.revision,
            total: state.records.len(),
            visible: &state.visible,
        });
    }

    println!(
        "{} {} of {} records",
        "UPDATE".green(),
        state.visible.len(),
        state.records.len()
    );
    for record in &state.visible {
        output::record_row(record);
    }
    println!();
    Ok(())
}
