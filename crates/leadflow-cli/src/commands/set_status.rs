//! Set status command implementation.

use anyhow::{Context, Result};
use clap::Args;

use leadflow_core::{ActorId, ActorMetadata, RecordId, Status, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct SetStatusArgs {
    /// Collection name
    pub collection: String,

    /// Record id
    pub id: String,

    /// New status (e.g., contacted)
    pub status: String,

    /// Reassign the record to this actor at the same time
    #[arg(long)]
    pub assign_to: Option<String>,
}

pub async fn run(args: SetStatusArgs, store: Option<&str>) -> Result<()> {
    let workflow = profile::workflow(store, &args.collection, WorkflowConfig::default())?;

    let id = RecordId::new(&args.id).context("Invalid record id")?;
    let status = Status::new(&args.status).context("Invalid status")?;
    let meta = match &args.assign_to {
        Some(actor) => ActorMetadata::assign(ActorId::new(actor).context("Invalid assignee")?),
        None => ActorMetadata::none(),
    };

    let record = workflow
        .update_status(&id, status, meta)
        .await
        .context("Failed to update status")?;

    output::success(&format!("Record {} is now {}", record.id, record.status));
    if let Some(assignee) = &record.assigned_to {
        output::field("Assigned to", assignee.as_str());
    }
    output::field("Updated", &record.updated_at.to_rfc3339());

    Ok(())
}
