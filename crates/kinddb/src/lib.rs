//! ## Crate layout
//! - `config`: explicit client settings, loadable from TOML.
//! - `db`: native keys and records, codec, query builder, relations,
//!   the `Datastore` seam and the `DatastoreClient` facade.
//! - `model`: entity, attribute and relation descriptors plus the registry.
//! - `traits`: the `FieldValues` accessor table and `FieldValue` conversions.
//! - `value`: the store-agnostic `Value`.
//!
//! Derives live at the crate root: `FieldValues`, `EmbeddedValue` and
//! `EnumValue`. Generated code refers to `::kinddb`, so paths below mirror
//! `kinddb-core` one to one.

pub use kinddb_core as core;
pub use kinddb_core::{config, db, error, model, serialize, traits, value};
pub use kinddb_core::{ErrorClass, ErrorOrigin, InternalError};
pub use kinddb_derive::{EmbeddedValue, EnumValue, FieldValues};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///
/// Everything needed to declare an entity, describe it and run the client.
///

pub mod prelude {
    pub use crate::{EmbeddedValue, EnumValue, FieldValues};
    pub use kinddb_core::prelude::*;
}
