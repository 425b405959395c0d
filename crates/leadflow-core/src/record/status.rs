//! Status tags and the (optional) transition policy.
//!
//! Statuses are free-form string tags. By default any status may be set
//! from any other: there is no enforced state machine, and
//! [`TransitionPolicy::Open`] exists to make that an explicit choice rather
//! than an accident. A [`TransitionTable`] can be opted into when a
//! collection needs a real workflow.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};

/// A workflow stage tag such as `open`, `in_progress` or `bought`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Status(String);

impl Status {
    /// Create a status tag. Tags must be non-empty and contain no whitespace.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(ValidationError::Other {
                message: format!("invalid status '{}': must be a non-empty tag without spaces", s),
            }
            .into());
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Status {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.0
    }
}

/// A named vocabulary of statuses with its terminal members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSet {
    initial: Status,
    statuses: Vec<Status>,
    terminal: BTreeSet<Status>,
}

impl StatusSet {
    /// Build a set from tags; the first tag is the initial status.
    pub fn new(statuses: &[&str], terminal: &[&str]) -> Result<Self, Error> {
        let statuses = statuses
            .iter()
            .map(|s| Status::new(*s))
            .collect::<Result<Vec<_>, _>>()?;
        let initial = statuses.first().cloned().ok_or_else(|| ValidationError::Other {
            message: "a status set needs at least one status".to_string(),
        })?;
        let terminal = terminal
            .iter()
            .map(|s| Status::new(*s))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            initial,
            statuses,
            terminal,
        })
    }

    /// Support tickets: `open` through `closed`.
    pub fn tickets() -> Self {
        Self::preset(
            &["open", "assigned", "in_progress", "resolved", "closed"],
            &["closed"],
        )
    }

    /// Sales leads: `new` through `bought`/`lost`.
    pub fn leads() -> Self {
        Self::preset(
            &[
                "new",
                "contacted",
                "interested",
                "demo_scheduled",
                "negotiating",
                "bought",
                "lost",
            ],
            &["bought", "lost"],
        )
    }

    fn preset(statuses: &[&str], terminal: &[&str]) -> Self {
        let to_status = |s: &&str| Status(s.to_string());
        Self {
            initial: Status(statuses[0].to_string()),
            statuses: statuses.iter().map(to_status).collect(),
            terminal: terminal.iter().map(to_status).collect(),
        }
    }

    /// Status given to records created without one.
    pub fn initial(&self) -> &Status {
        &self.initial
    }

    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    pub fn contains(&self, status: &Status) -> bool {
        self.statuses.contains(status)
    }

    /// Terminal statuses end the soft lifecycle of a record.
    pub fn is_terminal(&self, status: &Status) -> bool {
        self.terminal.contains(status)
    }
}

/// An explicit table of allowed `from -> to` moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    allowed: BTreeMap<Status, BTreeSet<Status>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow moving from `from` to each of `to`.
    pub fn allow(mut self, from: &Status, to: &[Status]) -> Self {
        self.allowed
            .entry(from.clone())
            .or_default()
            .extend(to.iter().cloned());
        self
    }

    /// Staying in the same status is always allowed.
    pub fn permits(&self, from: &Status, to: &Status) -> bool {
        from == to || self.allowed.get(from).is_some_and(|next| next.contains(to))
    }
}

/// How status changes are validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Every status is reachable from every other.
    #[default]
    Open,
    /// Only moves listed in the table are allowed.
    Table(TransitionTable),
}

impl TransitionPolicy {
    pub fn check(&self, from: &Status, to: &Status) -> Result<(), ValidationError> {
        match self {
            TransitionPolicy::Open => Ok(()),
            TransitionPolicy::Table(table) if table.permits(from, to) => Ok(()),
            TransitionPolicy::Table(_) => Err(ValidationError::Transition {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}
