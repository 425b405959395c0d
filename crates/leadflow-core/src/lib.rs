//! leadflow-core - Live filtered record workflow.
//!
//! Every dashboard in a lead-management app does the same thing: open a
//! role-scoped live query over a shared collection, narrow it with a search
//! box and a status dropdown, and move records between statuses. This crate
//! implements that once, against any [`DocumentStore`].
//!
//! # Example
//!
//! ```no_run
//! use leadflow_core::{
//!     Actor, ActorId, ActorMetadata, ClientFilter, CollectionName, MemoryStore, NewRecord,
//!     Query, RecordWorkflow, Role, Status,
//! };
//!
//! # async fn example() -> Result<(), leadflow_core::Error> {
//! let actor = Actor::new(ActorId::new("ops@example.com")?, Role::Manager);
//! let leads = CollectionName::new("leads")?;
//! let workflow = RecordWorkflow::new(MemoryStore::new(), leads, actor);
//!
//! let id = workflow
//!     .create_record(NewRecord::new().field("title", "Grade 9 maths"))
//!     .await?;
//!
//! let mut view = workflow.live_view(Query::all(), ClientFilter::default()).await?;
//! if let Some(state) = view.next().await {
//!     println!("{} visible", state?.visible.len());
//! }
//!
//! workflow
//!     .update_status(&id, Status::new("contacted")?, ActorMetadata::none())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod memory;
pub mod query;
pub mod record;
pub mod role;
pub mod traits;
pub mod types;
pub mod workflow;

pub use error::Error;
pub use filter::{ClientFilter, StatusFilter, apply_client_filter};
pub use memory::MemoryStore;
pub use query::{Direction, FieldFilter, OrderBy, Query};
pub use record::{
    ActorMetadata, Document, NewRecord, Record, RecordPatch, Status, StatusSet, TransitionPolicy,
    TransitionTable,
};
pub use role::{Actor, Role};
pub use traits::{DocumentStore, Snapshot, Subscription};
pub use types::{ActorId, CollectionName, RecordId, StoreUrl};
pub use workflow::{
    Confirm, DeleteOutcome, LiveView, RecordWorkflow, RetryPolicy, ViewState, WorkflowConfig,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
