//! Subcommand implementations.

mod create;
mod delete;
mod get;
mod list;
mod profile;
mod set_status;
mod watch;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the saved actor, role and store
    Profile(profile::ProfileCommand),

    /// Create a new record in a collection
    Create(create::CreateArgs),

    /// Fetch a single record
    Get(get::GetArgs),

    /// Print the records visible to you, filtered
    List(list::ListArgs),

    /// Follow a collection live, re-printing on every change
    Watch(watch::WatchArgs),

    /// Move a record to a new status
    SetStatus(set_status::SetStatusArgs),

    /// Delete a record
    Delete(delete::DeleteArgs),
}

pub async fn handle(cmd: Commands, store: Option<&str>) -> Result<()> {
    match cmd {
        Commands::Profile(cmd) => profile::handle(cmd, store),
        Commands::Create(args) => create::run(args, store).await,
        Commands::Get(args) => get::run(args, store).await,
        Commands::List(args) => list::run(args, store).await,
        Commands::Watch(args) => watch::run(args, store).await,
        Commands::SetStatus(args) => set_status::run(args, store).await,
        Commands::Delete(args) => delete::run(args, store).await,
    }
}
