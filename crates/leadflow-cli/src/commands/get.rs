//! Get record command implementation.

use anyhow::{Context, Result};
use clap::Args;

use leadflow_core::{RecordId, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,
}

pub async fn run(args: GetArgs, store: Option<&str>) -> Result<()> {
    let workflow = profile::workflow(store, &args.collection, WorkflowConfig::default())?;
    let id = RecordId::new(&args.id).context("Invalid record id")?;

    let record = workflow
        .get_record(&id)
        .await
        .context("Failed to get record")?;

    output::json_pretty(&record)?;

    Ok(())
}
