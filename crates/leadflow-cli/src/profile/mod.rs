//! Profile handling and store selection.

pub mod storage;
mod types;

pub use types::CliStore;

use anyhow::{Context, Result};

use leadflow_core::{CollectionName, RecordWorkflow, StoreUrl, WorkflowConfig};

const NO_PROFILE: &str = "No profile. Run 'leadflow profile set --store <url> --actor <id> --role <role>' first.";

/// Build a workflow for `collection` from the saved profile, with
/// `store_override` (from `--store` or `LEADFLOW_STORE`) taking precedence
/// over the profile's store.
pub fn workflow(
    store_override: Option<&str>,
    collection: &str,
    config: WorkflowConfig,
) -> Result<RecordWorkflow<CliStore>> {
    let profile = storage::load_profile()
        .context("Failed to load profile")?
        .context(NO_PROFILE)?;

    let url = match store_override {
        Some(url) => StoreUrl::new(url).context("Invalid store URL")?,
        None => profile.store,
    };

    let collection = CollectionName::new(collection).context("Invalid collection name")?;
    let store = CliStore::open(&url).context("Failed to open store")?;

    tracing::debug!(store = %url, actor = %profile.actor.id, %collection, "Opening workflow");
    Ok(RecordWorkflow::with_config(
        store,
        collection,
        profile.actor,
        config,
    ))
}
