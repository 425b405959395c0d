//! Profile commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use leadflow_core::{Actor, ActorId, Role, StoreUrl};

use crate::output;
use crate::profile::storage::{self, Profile};

#[derive(Args, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProfileSubcommand {
    /// Save the actor and role to act as (use the global --store for the store)
    Set(SetArgs),

    /// Display the saved profile
    Show,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Actor id (e.g., an email address)
    #[arg(long)]
    pub actor: String,

    /// Role: admin, manager, vertical_head, team_leader, sales or tutor
    #[arg(long)]
    pub role: String,
}

pub fn handle(cmd: ProfileCommand, store: Option<&str>) -> Result<()> {
    match cmd.command {
        ProfileSubcommand::Set(args) => set(args, store),
        ProfileSubcommand::Show => show(store),
    }
}

fn set(args: SetArgs, store: Option<&str>) -> Result<()> {
    // Keep the previous store when only the actor or role changes.
    let store = match store {
        Some(url) => StoreUrl::new(url).context("Invalid store URL")?,
        None => storage::load_profile()
            .context("Failed to load profile")?
            .map(|p| p.store)
            .context("--store is required when no profile exists yet")?,
    };

    let id = ActorId::new(&args.actor).context("Invalid actor id")?;
    let role: Role = args.role.parse().context("Invalid role")?;

    let profile = Profile {
        store,
        actor: Actor::new(id, role),
    };
    storage::save_profile(&profile)?;

    output::success(&format!(
        "Acting as {} ({}) on {}",
        profile.actor.id, profile.actor.role, profile.store
    ));
    Ok(())
}

fn show(store: Option<&str>) -> Result<()> {
    let profile = storage::load_profile()
        .context("Failed to load profile")?
        .context("No profile. Run 'leadflow profile set' first.")?;

    output::field("Actor", profile.actor.id.as_str());
    output::field("Role", profile.actor.role.as_str());
    output::field("Store", profile.store.as_str());
    if let Some(url) = store {
        output::field("Store override", url);
    }

    Ok(())
}
