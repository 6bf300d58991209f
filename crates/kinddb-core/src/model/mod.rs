//! Runtime descriptors for mapped entities.
//!
//! Descriptors are plain data assembled once at startup through
//! `EntityModelBuilder` and looked up by name through `ModelRegistry`.
//! The codec, relation resolver and query builder read them; nothing
//! mutates them after registration.

pub mod entity;
pub mod field;
pub mod registry;
pub mod relation;


// re-exports
pub use entity::{Discriminator, EntityModel, EntityModelBuilder, IdKind, IdentifierModel};
pub use field::{AttributeKind, EmbeddableModel, FieldModel, ScalarType};
pub use registry::ModelRegistry;
pub use relation::{Cardinality, JoinSide, JoinTableModel, RelationModel};
