//! The mapping engine: type-driven dispatch between Rust values and
//! backends.
//!
//! [`map_value`]/[`unmap_value`] are the only entry points; they consult
//! the active [`Policies`] first and fall back to the type's own
//! [`Mappable`] implementation. Everything else in the crate exists to
//! make implementing `Mappable` mechanical: the `record!` and
//! `enumeration!` macros emit it for user shapes, `impls` covers the
//! built-in ones.

use std::any::TypeId;
use std::fmt;

use crate::backend::{Deserializer, Serializer};
use crate::error::MapError;
use crate::policy::Policies;
use crate::record::SequenceRecord;
use crate::scalar::Scalar;

/// A type the engine knows how to move across the backend contract.
pub trait Mappable: Sized + 'static {
    fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError>;
    fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<Self, MapError>;
}

/// Maps `value` onto the backend, honoring `policies`.
pub fn map_value<T: Mappable>(
    value: &T,
    ser: &mut dyn Serializer,
    policies: &Policies,
) -> Result<(), MapError> {
    if let Some(result) = policies.map_with_policy(TypeId::of::<T>(), value, ser) {
        return result;
    }
    value.map(ser, policies)
}

/// Reads a `T` from the backend, honoring `policies`.
pub fn unmap_value<T: Mappable>(
    de: &mut dyn Deserializer,
    policies: &Policies,
) -> Result<T, MapError> {
    if let Some(result) = policies.unmap_with_policy(TypeId::of::<T>(), de) {
        return result?
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| MapError::Unsupported("policy produced foreign type".to_owned()));
    }
    T::unmap(de, policies)
}

/// Writes a scalar, degrading it to canonical text first when the backend
/// does not carry its kind natively.
///
/// Backends are required to support at least the null, bool, numeric and
/// string kinds, so degradation always terminates.
pub fn emit_scalar(ser: &mut dyn Serializer, value: Scalar) -> Result<(), MapError> {
    if ser.supports(value.kind()) {
        ser.write_scalar(value)
    } else {
        ser.write_scalar(value.canonical())
    }
}

/// An enumeration shape, as emitted by the `enumeration!` macro.
///
/// Enumerations map through their discriminant by default; the `by_name`
/// field directive switches individual record fields to the symbolic
/// name instead.
pub trait Enumerated: Sized + Copy + 'static {
    /// Underlying discriminant type.
    type Repr: Mappable + Copy + PartialEq + fmt::Display;

    /// All variant names, in declaration order.
    const NAMES: &'static [&'static str];

    fn name(&self) -> &'static str;
    fn from_name(name: &str) -> Option<Self>;
    fn to_repr(&self) -> Self::Repr;
    fn from_repr(value: Self::Repr) -> Option<Self>;
}

/// Maps an enumeration as its symbolic variant name.
pub fn map_enum_by_name<E: Enumerated>(
    value: &E,
    ser: &mut dyn Serializer,
) -> Result<(), MapError> {
    emit_scalar(ser, Scalar::Str(value.name().to_owned()))
}

/// Reads an enumeration written as its symbolic variant name.
pub fn unmap_enum_by_name<E: Enumerated>(de: &mut dyn Deserializer) -> Result<E, MapError> {
    let name = de.read_scalar()?.into_string()?;
    E::from_name(&name).ok_or(MapError::UnknownName {
        kind: "enum variant",
        name,
    })
}

/// Maps a record member declared `by_name`. A representation policy
/// registered for the enumeration type still takes precedence over the
/// directive.
pub fn map_enum_member<E: Enumerated>(
    value: &E,
    ser: &mut dyn Serializer,
    policies: &Policies,
) -> Result<(), MapError> {
    if let Some(result) = policies.map_with_policy(TypeId::of::<E>(), value, ser) {
        return result;
    }
    map_enum_by_name(value, ser)
}

/// Read counterpart of [`map_enum_member`].
pub fn unmap_enum_member<E: Enumerated>(
    de: &mut dyn Deserializer,
    policies: &Policies,
) -> Result<E, MapError> {
    if let Some(result) = policies.unmap_with_policy(TypeId::of::<E>(), de) {
        return result?
            .downcast::<E>()
            .map(|boxed| *boxed)
            .map_err(|_| MapError::Unsupported("policy produced foreign type".to_owned()));
    }
    unmap_enum_by_name(de)
}

/// Maps a record member declared `as_sequence`. A representation policy
/// registered for the nested record type still takes precedence over the
/// directive.
pub fn map_sequence_member<R: SequenceRecord + 'static>(
    value: &R,
    ser: &mut dyn Serializer,
    policies: &Policies,
) -> Result<(), MapError> {
    if let Some(result) = policies.map_with_policy(TypeId::of::<R>(), value, ser) {
        return result;
    }
    value.map_sequence(ser, policies)
}

/// Read counterpart of [`map_sequence_member`].
pub fn unmap_sequence_member<R: SequenceRecord + 'static>(
    de: &mut dyn Deserializer,
    policies: &Policies,
) -> Result<R, MapError> {
    if let Some(result) = policies.unmap_with_policy(TypeId::of::<R>(), de) {
        return result?
            .downcast::<R>()
            .map(|boxed| *boxed)
            .map_err(|_| MapError::Unsupported("policy produced foreign type".to_owned()));
    }
    R::unmap_sequence(de, policies)
}

/// A type usable as a dictionary key.
///
/// Dictionary keys are always strings on the wire; `MapKey` is the
/// to-and-from-string bridge for map-like containers.
pub trait MapKey: Sized {
    fn to_key(&self) -> String;
    fn from_key(key: &str) -> Result<Self, MapError>;
}

impl MapKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Result<String, MapError> {
        Ok(key.to_owned())
    }
}

macro_rules! impl_map_key_for_int {
    ($($ty:ty),+) => {$(
        impl MapKey for $ty {
            fn to_key(&self) -> String {
                self.to_string()
            }

            fn from_key(key: &str) -> Result<$ty, MapError> {
                key.parse::<$ty>().map_err(|_| MapError::TypeMismatch {
                    expected: stringify!($ty),
                    found: format!("key `{key}`"),
                })
            }
        }
    )+};
}

impl_map_key_for_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_map_keys() {
        assert_eq!(42u32.to_key(), "42");
        assert_eq!(u32::from_key("42").unwrap(), 42);
        assert!(matches!(
            i8::from_key("banana"),
            Err(MapError::TypeMismatch { .. })
        ));
    }
}
