//! leadflow-file - Filesystem-backed document store.
//!
//! Records live as one pretty-printed JSON file each under
//! `<root>/collections/<collection>/<id>.json`. Every mutation is appended
//! to `<root>/changes.jsonl`, which live subscriptions watch to know when
//! to re-read their collection.

mod backend;
mod store;
mod subscription;

pub use backend::FileBackend;
pub use store::{ChangeEvent, ChangeOp, FileStore};
