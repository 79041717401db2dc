//! Backend contract, directives, policies and the generic mapping
//! algorithm.
//!
//! This crate is representation-agnostic: it defines the [`Serializer`]
//! and [`Deserializer`] halves of the backend contract, the closed
//! [`Scalar`] lattice they exchange, and the [`Mappable`] dispatch that
//! moves arbitrary Rust shapes across it. Concrete value models plug in
//! from the outside (`dynval-json`, `dynval-bson`).
//!
//! User shapes are declared with the [`record!`] and [`enumeration!`]
//! macros; per-field directives (renaming, optionality, ignoring,
//! by-name enums, positional nesting) live in the declaration. Runtime
//! representation swaps go through [`Policies`].

pub mod backend;
pub mod error;
mod impls;
mod macros;
pub mod mapper;
pub mod policy;
pub mod record;
pub mod scalar;

pub use backend::{Deserializer, Serializer};
pub use error::MapError;
pub use mapper::{
    emit_scalar, map_enum_by_name, map_enum_member, map_sequence_member, map_value,
    unmap_enum_by_name, unmap_enum_member, unmap_sequence_member, unmap_value, Enumerated, MapKey,
    Mappable,
};
pub use policy::Policies;
pub use record::{
    external_name, FieldDef, FieldMode, FieldVia, Record, SequenceRecord, WireName,
};
pub use scalar::{Bytes, DateTime, ObjectId, RegexValue, Scalar, ScalarKind, Timestamp};

#[cfg(test)]
pub(crate) mod testutil;
