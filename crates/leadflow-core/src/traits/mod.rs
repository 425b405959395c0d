//! The document-store boundary.

mod store;
mod subscription;

pub use store::DocumentStore;
pub use subscription::{Snapshot, Subscription};
