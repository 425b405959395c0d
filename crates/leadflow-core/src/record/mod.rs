//! Records and their status tags.
//!
//! A [`Record`] is one document in a shared collection: an id assigned by
//! the store, a free-form [`Status`], owner fields, writer-set timestamps
//! and an arbitrary JSON payload.

mod status;
mod types;

pub use status::{Status, StatusSet, TransitionPolicy, TransitionTable};
pub use types::{
    ActorMetadata, Document, NewRecord, RESERVED_FIELDS, Record, RecordPatch, check_payload,
};
