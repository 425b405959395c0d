//! Profile storage: who the CLI acts as and which store it talks to.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use leadflow_core::{Actor, ActorId, Role, StoreUrl};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Stored profile data.
#[derive(Debug, Serialize, Deserialize)]
struct StoredProfile {
    store: String,
    actor: String,
    role: Role,
}

/// A loaded, validated profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub store: StoreUrl,
    pub actor: Actor,
}

/// Get the profile file path.
fn profile_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "leadflow").context("Could not determine config directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("profile.json"))
}

/// Save a profile to disk.
pub fn save_profile(profile: &Profile) -> Result<()> {
    let stored = StoredProfile {
        store: profile.store.to_string(),
        actor: profile.actor.id.to_string(),
        role: profile.actor.role,
    };

    let path = profile_path()?;
    let json = serde_json::to_string_pretty(&stored)?;

    fs::write(&path, &json).context("Failed to write profile file")?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

/// Load the profile from disk, if one has been saved.
pub fn load_profile() -> Result<Option<Profile>> {
    let path = profile_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&path).context("Failed to read profile file")?;
    let stored: StoredProfile = serde_json::from_str(&json).context("Invalid profile file")?;

    let store = StoreUrl::new(&stored.store).context("Invalid store URL in profile")?;
    let id = ActorId::new(stored.actor).context("Invalid actor in profile")?;

    Ok(Some(Profile {
        store,
        actor: Actor::new(id, stored.role),
    }))
}
