//! Store-facing half of the crate: native keys and records, the codec
//! between entities and records, query translation, relation handling,
//! the `Datastore` seam and the client facade tying them together.

pub mod client;
pub mod codec;
pub mod key;
pub mod query;
pub mod record;
pub mod relation;
pub mod store;

// re-exports
pub use client::{
    DatastoreClient, Found, JoinTableData, ProjectedRow, QueryOutput, RelationHolder,
    RelationTarget,
};
pub use key::{KeyId, NativeKey};
pub use record::{EmbeddedRecord, NativeRecord, NativeValue};
pub use store::{Datastore, MemoryStore};
