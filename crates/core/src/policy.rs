//! Representation policies.
//!
//! A policy swaps the wire representation of a type without touching the
//! type itself: `represent::<T, R>` registers a pair of conversions and
//! the engine maps the `R` it produces instead of `T`. Policies are
//! consulted before any other dispatch rule, first registration wins.

use std::any::{Any, TypeId};

use crate::backend::{Deserializer, Serializer};
use crate::error::MapError;
use crate::mapper::{map_value, unmap_value, Mappable};

type MapFn =
    Box<dyn Fn(&dyn Any, &mut dyn Serializer, &Policies) -> Result<(), MapError> + Send + Sync>;
type UnmapFn =
    Box<dyn Fn(&mut dyn Deserializer, &Policies) -> Result<Box<dyn Any>, MapError> + Send + Sync>;

struct PolicyEntry {
    type_id: TypeId,
    map: MapFn,
    unmap: UnmapFn,
}

/// An ordered, optionally named set of representation policies.
///
/// The empty set is the default for every convenience entry point; the
/// name participates in conditional field ignoring (see the record
/// directive `ignore("...")`).
#[derive(Default)]
pub struct Policies {
    name: Option<&'static str>,
    entries: Vec<PolicyEntry>,
}

impl Policies {
    pub fn new() -> Policies {
        Policies::default()
    }

    pub fn named(name: &'static str) -> Policies {
        Policies {
            name: Some(name),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Registers a representation for `T`: `to_wire` runs on every map of
    /// a `T`, `from_wire` on every unmap.
    ///
    /// `R` must not be `T` itself and must not carry a policy back to `T`,
    /// or mapping recurses without progress.
    pub fn represent<T, R>(
        mut self,
        to_wire: impl Fn(&T) -> R + Send + Sync + 'static,
        from_wire: impl Fn(R) -> T + Send + Sync + 'static,
    ) -> Policies
    where
        T: 'static,
        R: Mappable + 'static,
    {
        let map: MapFn = Box::new(move |value, ser, policies| {
            let value = value
                .downcast_ref::<T>()
                .ok_or_else(|| MapError::Unsupported("policy applied to foreign type".to_owned()))?;
            map_value(&to_wire(value), ser, policies)
        });
        let unmap: UnmapFn = Box::new(move |de, policies| {
            let wire: R = unmap_value(de, policies)?;
            Ok(Box::new(from_wire(wire)) as Box<dyn Any>)
        });
        self.entries.push(PolicyEntry {
            type_id: TypeId::of::<T>(),
            map,
            unmap,
        });
        self
    }

    pub(crate) fn map_with_policy(
        &self,
        id: TypeId,
        value: &dyn Any,
        ser: &mut dyn Serializer,
    ) -> Option<Result<(), MapError>> {
        self.entries
            .iter()
            .find(|e| e.type_id == id)
            .map(|e| (e.map)(value, ser, self))
    }

    pub(crate) fn unmap_with_policy(
        &self,
        id: TypeId,
        de: &mut dyn Deserializer,
    ) -> Option<Result<Box<dyn Any>, MapError>> {
        self.entries
            .iter()
            .find(|e| e.type_id == id)
            .map(|e| (e.unmap)(de, self))
    }
}
