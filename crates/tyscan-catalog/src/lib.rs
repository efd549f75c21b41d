//! Catalog entities and stores for the tyscan type scanner.
//!
//! The catalog is the scanner's output graph: one entity per reachable
//! declaration, held in three concurrent stores (types, values, packages)
//! and cross-referenced by canonical id. Named entities are interned once;
//! unnamed composites live inline on their referent. Expansion of fields,
//! methods, and embeds is deferred behind a single-fire load slot so that
//! cyclic declarations cannot recurse during construction.

pub mod entity;
pub mod loader;
pub mod package;
pub mod serialize;
pub mod store;

pub use entity::{
    Entity, EntityData, EntityKind, Field, FuncData, Param, TypeArg, TypeRef, UnionTerm,
};
pub use loader::{LoadPlan, LoadSlot, LoadState};
pub use package::{PACKAGE_DOC_KEY, PackageEntity};
pub use serialize::Serializer;
pub use store::{Catalog, Store};
