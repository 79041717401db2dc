//! `Mappable` implementations for built-in types.
//!
//! Numbers narrow on decode with an overflow check; the exotic scalar
//! types additionally accept their canonical textual form so values
//! survive a round trip through backends that degrade them.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::backend::{Deserializer, Serializer};
use crate::error::MapError;
use crate::mapper::{emit_scalar, map_value, unmap_value, MapKey, Mappable};
use crate::policy::Policies;
use crate::scalar::{Bytes, DateTime, ObjectId, RegexValue, Scalar, Timestamp};

impl Mappable for bool {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Bool(*self))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<bool, MapError> {
        de.read_scalar()?.into_bool()
    }
}

impl Mappable for String {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Str(self.clone()))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<String, MapError> {
        de.read_scalar()?.into_string()
    }
}

impl Mappable for char {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Str(self.to_string()))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<char, MapError> {
        let text = de.read_scalar()?.into_string()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(MapError::TypeMismatch {
                expected: "single character",
                found: format!("string of {} chars", text.chars().count()),
            }),
        }
    }
}

macro_rules! impl_mappable_for_int {
    ($($ty:ty => $scalar:expr),+ $(,)?) => {$(
        impl Mappable for $ty {
            fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
                emit_scalar(ser, $scalar(*self))
            }

            fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<$ty, MapError> {
                let wide = de.read_scalar()?.into_i64()?;
                <$ty>::try_from(wide).map_err(|_| MapError::Overflow {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )+};
}

impl_mappable_for_int! {
    i8 => |v| Scalar::Int32(v as i32),
    i16 => |v| Scalar::Int32(v as i32),
    i32 => Scalar::Int32,
    i64 => Scalar::Int64,
    isize => |v| Scalar::Int64(v as i64),
    u8 => |v| Scalar::Int32(v as i32),
    u16 => |v| Scalar::Int32(v as i32),
    u32 => |v| Scalar::Int64(v as i64),
}

macro_rules! impl_mappable_for_uint {
    ($($ty:ty),+) => {$(
        impl Mappable for $ty {
            fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
                emit_scalar(ser, Scalar::UInt64(*self as u64))
            }

            fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<$ty, MapError> {
                let wide = de.read_scalar()?.into_u64()?;
                <$ty>::try_from(wide).map_err(|_| MapError::Overflow {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )+};
}

impl_mappable_for_uint!(u64, usize);

impl Mappable for f64 {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Float(*self))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<f64, MapError> {
        de.read_scalar()?.into_f64()
    }
}

impl Mappable for f32 {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Float(*self as f64))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<f32, MapError> {
        Ok(de.read_scalar()?.into_f64()? as f32)
    }
}

impl Mappable for BigInt {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::BigInt(self.clone()))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<BigInt, MapError> {
        de.read_scalar()?.into_bigint()
    }
}

impl Mappable for Bytes {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Bytes(self.0.clone()))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<Bytes, MapError> {
        match de.read_scalar()? {
            Scalar::Bytes(v) => Ok(Bytes(v)),
            Scalar::Str(s) => Bytes::from_base64(&s),
            other => Err(MapError::TypeMismatch {
                expected: "bytes",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

impl Mappable for ObjectId {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::ObjectId(*self))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<ObjectId, MapError> {
        match de.read_scalar()? {
            Scalar::ObjectId(v) => Ok(v),
            Scalar::Str(s) => ObjectId::from_hex(&s),
            other => Err(MapError::TypeMismatch {
                expected: "object-id",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

impl Mappable for DateTime {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::DateTime(*self))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<DateTime, MapError> {
        match de.read_scalar()? {
            Scalar::DateTime(v) => Ok(v),
            Scalar::Str(s) => DateTime::from_iso_string(&s),
            other => Err(MapError::TypeMismatch {
                expected: "date",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

impl Mappable for Timestamp {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Timestamp(*self))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<Timestamp, MapError> {
        match de.read_scalar()? {
            Scalar::Timestamp(v) => Ok(v),
            Scalar::Str(s) => {
                let packed = s.parse::<u64>().map_err(|_| MapError::Parse {
                    message: format!("invalid timestamp `{s}`"),
                    line: 0,
                })?;
                Ok(Timestamp::from_packed(packed))
            }
            other => Err(MapError::TypeMismatch {
                expected: "timestamp",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

impl Mappable for RegexValue {
    fn map(&self, ser: &mut dyn Serializer, _: &Policies) -> Result<(), MapError> {
        emit_scalar(ser, Scalar::Regex(self.clone()))
    }

    fn unmap(de: &mut dyn Deserializer, _: &Policies) -> Result<RegexValue, MapError> {
        match de.read_scalar()? {
            Scalar::Regex(v) => Ok(v),
            Scalar::Str(s) => RegexValue::from_text(&s),
            other => Err(MapError::TypeMismatch {
                expected: "regex",
                found: other.type_name().to_owned(),
            }),
        }
    }
}

impl<T: Mappable> Mappable for Option<T> {
    fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError> {
        match self {
            Some(value) => map_value(value, ser, policies),
            None => emit_scalar(ser, Scalar::Null),
        }
    }

    fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<Option<T>, MapError> {
        if de.try_read_null()? {
            Ok(None)
        } else {
            Ok(Some(unmap_value(de, policies)?))
        }
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError> {
        ser.begin_array(Some(self.len()))?;
        for (i, item) in self.iter().enumerate() {
            map_value(item, ser, policies).map_err(|e| e.at_index(i))?;
        }
        ser.end_array()
    }

    fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<Vec<T>, MapError> {
        let mut out = Vec::new();
        de.read_array(&mut |_| {}, &mut |de| {
            let item = unmap_value(de, policies).map_err(|e| e.at_index(out.len()))?;
            out.push(item);
            Ok(())
        })?;
        Ok(out)
    }
}

impl<T: Mappable, const N: usize> Mappable for [T; N] {
    fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError> {
        ser.begin_array(Some(N))?;
        for (i, item) in self.iter().enumerate() {
            map_value(item, ser, policies).map_err(|e| e.at_index(i))?;
        }
        ser.end_array()
    }

    fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<[T; N], MapError> {
        let items: Vec<T> = Vec::unmap(de, policies)?;
        let found = items.len();
        items.try_into().map_err(|_| MapError::LengthMismatch {
            expected: N,
            found,
        })
    }
}

macro_rules! impl_mappable_for_tuple {
    ($len:expr => $($ty:ident : $idx:tt),+) => {
        impl<$($ty: Mappable),+> Mappable for ($($ty,)+) {
            fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError> {
                ser.begin_array(Some($len))?;
                $(map_value(&self.$idx, ser, policies).map_err(|e| e.at_index($idx))?;)+
                ser.end_array()
            }

            fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<Self, MapError> {
                let mut slots: ($(Option<$ty>,)+) = Default::default();
                let mut pos = 0usize;
                de.read_array(&mut |_| {}, &mut |de| {
                    match pos {
                        $($idx => {
                            slots.$idx =
                                Some(unmap_value(de, policies).map_err(|e| e.at_index($idx))?);
                        })+
                        _ => {
                            return Err(MapError::LengthMismatch {
                                expected: $len,
                                found: pos + 1,
                            })
                        }
                    }
                    pos += 1;
                    Ok(())
                })?;
                if pos != $len {
                    return Err(MapError::LengthMismatch {
                        expected: $len,
                        found: pos,
                    });
                }
                Ok(($(slots.$idx.ok_or(MapError::LengthMismatch {
                    expected: $len,
                    found: pos,
                })?,)+))
            }
        }
    };
}

impl_mappable_for_tuple!(1 => A:0);
impl_mappable_for_tuple!(2 => A:0, B:1);
impl_mappable_for_tuple!(3 => A:0, B:1, C:2);
impl_mappable_for_tuple!(4 => A:0, B:1, C:2, D:3);
impl_mappable_for_tuple!(5 => A:0, B:1, C:2, D:3, E:4);
impl_mappable_for_tuple!(6 => A:0, B:1, C:2, D:3, E:4, F:5);

macro_rules! impl_mappable_for_map {
    ($map:ident, $($bound:path),+) => {
        impl<K, V> Mappable for $map<K, V>
        where
            K: MapKey $(+ $bound)+ + 'static,
            V: Mappable,
        {
            fn map(&self, ser: &mut dyn Serializer, policies: &Policies) -> Result<(), MapError> {
                ser.begin_dictionary()?;
                for (k, v) in self.iter() {
                    let key = k.to_key();
                    ser.begin_entry(&key)?;
                    map_value(v, ser, policies).map_err(|e| e.at(&key))?;
                }
                ser.end_dictionary()
            }

            fn unmap(de: &mut dyn Deserializer, policies: &Policies) -> Result<Self, MapError> {
                let mut out = $map::new();
                de.read_dictionary(&mut |de, key| {
                    let k = K::from_key(key).map_err(|e| e.at(key))?;
                    let v = unmap_value(de, policies).map_err(|e| e.at(key))?;
                    out.insert(k, v);
                    Ok(())
                })?;
                Ok(out)
            }
        }
    };
}

impl_mappable_for_map!(IndexMap, Hash, Eq);
impl_mappable_for_map!(HashMap, Hash, Eq);
impl_mappable_for_map!(BTreeMap, Ord);
