//! Roles, visibility scopes and write permissions.
//!
//! Visibility is enforced by building a different [`Query`] per role, and
//! writes are checked against the same scope before anything reaches the
//! store. Nothing here assumes the store has its own rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};
use crate::query::{FieldFilter, OrderBy, Query};
use crate::record::Record;
use crate::types::ActorId;

/// A dashboard role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    VerticalHead,
    TeamLeader,
    Sales,
    Tutor,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::VerticalHead,
        Role::TeamLeader,
        Role::Sales,
        Role::Tutor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::VerticalHead => "vertical_head",
            Role::TeamLeader => "team_leader",
            Role::Sales => "sales",
            Role::Tutor => "tutor",
        }
    }

    /// Roles that see and may edit the whole collection.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::VerticalHead)
    }

    /// The live query a dashboard for this role subscribes with.
    pub fn scope(&self, actor: &ActorId) -> Query {
        let query = Query::all().order_by(OrderBy::newest_first());
        match self {
            Role::Admin | Role::Manager | Role::VerticalHead => query,
            Role::TeamLeader => query.filter(FieldFilter::eq("assignedBy", actor.as_str())),
            Role::Sales | Role::Tutor => {
                query.filter(FieldFilter::eq("assignedTo", actor.as_str()))
            }
        }
    }

    /// Whether `actor` with this role may change `record`.
    ///
    /// Non-privileged roles may edit what their scope shows them, plus
    /// anything they created themselves.
    pub fn can_update(&self, actor: &ActorId, record: &Record) -> bool {
        let created = record.created_by.as_ref() == Some(actor);
        match self {
            Role::Admin | Role::Manager | Role::VerticalHead => true,
            Role::TeamLeader => created || record.assigned_by.as_ref() == Some(actor),
            Role::Sales | Role::Tutor => created || record.assigned_to.as_ref() == Some(actor),
        }
    }

    /// Whether this role may hand records to someone else.
    pub fn can_assign(&self) -> bool {
        !matches!(self, Role::Sales | Role::Tutor)
    }

    /// Only admins and managers hard-delete records.
    pub fn can_delete(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                ValidationError::Other {
                    message: format!("unknown role '{}'", s),
                }
                .into()
            })
    }
}

/// The signed-in person a workflow acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn scope(&self) -> Query {
        self.role.scope(&self.id)
    }

    pub fn can_update(&self, record: &Record) -> bool {
        self.role.can_update(&self.id, record)
    }
}
