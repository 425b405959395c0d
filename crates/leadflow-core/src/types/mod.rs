//! Validated identifier types.
//!
//! These types check their invariants at construction time, so a
//! `RecordId` or `CollectionName` held anywhere in the crate is known to be
//! usable as a path segment and a query key.

mod actor;
mod collection;
mod record_id;
mod store_url;

pub use actor::ActorId;
pub use collection::CollectionName;
pub use record_id::RecordId;
pub use store_url::StoreUrl;
