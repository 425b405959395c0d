//! Interactive confirmation for irreversible actions.

/// Asks the user to confirm an action before it is carried out.
pub trait Confirm {
    /// Return `true` only if the user explicitly agreed.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirmation given up front (e.g. a `--yes` flag).
#[derive(Debug, Clone, Copy, Default)]
pub struct Preconfirmed;

impl Confirm for Preconfirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
