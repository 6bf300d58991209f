//! Core runtime for kinddb: entity descriptors, the record codec, query
//! translation and relation handling over a kind-keyed store, plus the
//! ergonomics exported via the `prelude`.

extern crate self as kinddb;

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod serialize;
pub mod traits;
pub mod value;

// re-exports
pub use error::{ErrorClass, ErrorOrigin, InternalError};

///
/// Prelude
///
/// Domain vocabulary for mapping entities and talking to a store.
/// Errors, codec internals and serializers stay behind their modules.
///

pub mod prelude {
    pub use crate::{
        config::ClientConfig,
        db::{Datastore, DatastoreClient, MemoryStore, RelationHolder, query::OrderingClause},
        model::{EntityModel, FieldModel, ModelRegistry, RelationModel, ScalarType},
        traits::{EntityKind, FieldValue, FieldValues},
        value::Value,
    };
}
