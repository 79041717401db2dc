//! The `record!` and `enumeration!` declaration macros.
//!
//! `record!` declares a struct together with its `Mappable`, `Record`
//! and `SequenceRecord` implementations. Field grammar, one directive
//! prefix per field:
//!
//! ```text
//! record! {
//!     pub struct Monster {
//!         name: String,                          // required
//!         optional level as "lvl": u32 = 1,      // defaulted, renamed
//!         ignore cached: u64,                    // never on the wire
//!         ignore("public") secret: String,       // off the wire under that policy set
//!         by_name kind: MonsterKind,             // enum as variant name
//!         as_sequence pos: Position,             // nested record as array
//!         type_: String,                         // wire name `type`
//!     }
//! }
//! ```
//!
//! A record declared `#[sequence]` travels as a positional array instead
//! of a dictionary.
//!
//! `enumeration!` declares a C-like enum mapping through its
//! discriminant, with `by_name` support via [`crate::Enumerated`]:
//!
//! ```text
//! enumeration! {
//!     pub enum Element: i32 { Fire = 1, Water, Earth }
//! }
//! ```

/// Declares a mappable record type. See the [module docs](self).
#[macro_export]
macro_rules! record {
    (
        #[sequence]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::record!(@parse [seq] [$(#[$meta])*] $vis $name [] $($body)*);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::record!(@parse [dict] [$(#[$meta])*] $vis $name [] $($body)*);
    };

    // Field munching. Directive arms come before the plain-field arms so
    // the directive keywords are never taken for field names.
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        optional $f:ident as $w:literal : $ty:ty = $def:expr $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [w $w] [opt] [value] [$def] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        optional $f:ident as $w:literal : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [w $w] [opt] [value] [::core::default::Default::default()] }]
            $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        optional $f:ident : $ty:ty = $def:expr $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [opt] [value] [$def] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        optional $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [opt] [value] [::core::default::Default::default()] }]
            $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        ignore ( $pol:literal ) $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [ignp $pol] [value] [::core::default::Default::default()] }]
            $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        ignore $f:ident : $ty:ty = $def:expr $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [ign] [value] [$def] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        ignore $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [ign] [value] [::core::default::Default::default()] }]
            $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        by_name $f:ident as $w:literal : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [w $w] [req] [by_name] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        by_name $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [req] [by_name] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        as_sequence $f:ident as $w:literal : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [w $w] [req] [seq] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        as_sequence $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [req] [seq] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        $f:ident as $w:literal : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [w $w] [req] [value] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]
        $f:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(@parse $shape $meta $vis $name
            [$($groups)* { $f [$ty] [auto] [req] [value] [] }] $($($rest)*)?);
    };
    (@parse $shape:tt $meta:tt $vis:vis $name:ident [$($groups:tt)*]) => {
        $crate::record!(@emit $shape $meta $vis $name [$($groups)*]);
    };

    // Emission.
    (@emit [dict] [$($meta:tt)*] $vis:vis $name:ident
        [$({ $f:ident [$ty:ty] $wire:tt $mode:tt $via:tt $def:tt })*]
    ) => {
        $crate::record!(@emit_common [$($meta)*] $vis $name
            [$({ $f [$ty] $wire $mode $via $def })*]);

        impl $crate::Mappable for $name {
            fn map(
                &self,
                ser: &mut dyn $crate::Serializer,
                policies: &$crate::Policies,
            ) -> Result<(), $crate::MapError> {
                ser.begin_dictionary()?;
                $($crate::record!(@map_field (self) (ser) (policies) $f $wire $mode $via $def);)*
                ser.end_dictionary()
            }

            fn unmap(
                de: &mut dyn $crate::Deserializer,
                policies: &$crate::Policies,
            ) -> Result<Self, $crate::MapError> {
                $(#[allow(unused_mut)] let mut $f: Option<$ty> = None;)*
                de.read_dictionary(&mut |de, key| {
                    $($crate::record!(@unmap_arm (de) (policies) (key) $f $wire $mode $via);)*
                    de.skip_value()
                })?;
                Ok($name {
                    $($f: $crate::record!(@finish $f $wire $mode $def),)*
                })
            }
        }
    };
    (@emit [seq] [$($meta:tt)*] $vis:vis $name:ident
        [$({ $f:ident [$ty:ty] $wire:tt $mode:tt $via:tt $def:tt })*]
    ) => {
        $crate::record!(@emit_common [$($meta)*] $vis $name
            [$({ $f [$ty] $wire $mode $via $def })*]);

        impl $crate::Mappable for $name {
            fn map(
                &self,
                ser: &mut dyn $crate::Serializer,
                policies: &$crate::Policies,
            ) -> Result<(), $crate::MapError> {
                $crate::SequenceRecord::map_sequence(self, ser, policies)
            }

            fn unmap(
                de: &mut dyn $crate::Deserializer,
                policies: &$crate::Policies,
            ) -> Result<Self, $crate::MapError> {
                <$name as $crate::SequenceRecord>::unmap_sequence(de, policies)
            }
        }
    };
    (@emit_common [$($meta:tt)*] $vis:vis $name:ident
        [$({ $f:ident [$ty:ty] $wire:tt $mode:tt $via:tt $def:tt })*]
    ) => {
        $($meta)*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(pub $f: $ty,)*
        }

        impl $crate::Record for $name {
            const NAME: &'static str = stringify!($name);
            const FIELDS: &'static [$crate::FieldDef] = &[
                $($crate::record!(@field_def $f $wire $mode $via),)*
            ];
        }

        impl $crate::SequenceRecord for $name {
            fn map_sequence(
                &self,
                ser: &mut dyn $crate::Serializer,
                policies: &$crate::Policies,
            ) -> Result<(), $crate::MapError> {
                let len = <$name as $crate::SequenceRecord>::sequence_len(policies);
                ser.begin_array(Some(len))?;
                #[allow(unused_mut, unused_variables)]
                let mut pos = 0usize;
                $($crate::record!(@seq_map_field (self) (ser) (policies) (pos) $f $mode $via);)*
                ser.end_array()
            }

            fn unmap_sequence(
                de: &mut dyn $crate::Deserializer,
                policies: &$crate::Policies,
            ) -> Result<Self, $crate::MapError> {
                $(#[allow(unused_mut)] let mut $f: Option<$ty> = None;)*
                let mut pos = 0usize;
                de.read_array(&mut |_| {}, &mut |de| {
                    #[allow(unused_mut, unused_variables)]
                    let mut slot = 0usize;
                    $($crate::record!(@seq_unmap_field (de) (policies) (pos) (slot) $f $mode $via);)*
                    Err($crate::MapError::LengthMismatch {
                        expected: <$name as $crate::SequenceRecord>::sequence_len(policies),
                        found: pos + 1,
                    })
                })?;
                let expected = <$name as $crate::SequenceRecord>::sequence_len(policies);
                if pos != expected {
                    return Err($crate::MapError::LengthMismatch {
                        expected,
                        found: pos,
                    });
                }
                Ok($name {
                    $($f: $crate::record!(@finish $f $wire $mode $def),)*
                })
            }
        }
    };

    // Field table entries.
    (@field_def $f:ident [auto] $mode:tt $via:tt) => {
        $crate::FieldDef {
            field: stringify!($f),
            wire: $crate::WireName::Auto(stringify!($f)),
            mode: $crate::record!(@mode $mode),
            via: $crate::record!(@via $via),
        }
    };
    (@field_def $f:ident [w $w:literal] $mode:tt $via:tt) => {
        $crate::FieldDef {
            field: stringify!($f),
            wire: $crate::WireName::Explicit($w),
            mode: $crate::record!(@mode $mode),
            via: $crate::record!(@via $via),
        }
    };
    (@mode [req]) => { $crate::FieldMode::Required };
    (@mode [opt]) => { $crate::FieldMode::Optional };
    (@mode [ign]) => { $crate::FieldMode::Ignored };
    (@mode [ignp $pol:literal]) => { $crate::FieldMode::IgnoredFor($pol) };
    (@via [value]) => { $crate::FieldVia::Value };
    (@via [by_name]) => { $crate::FieldVia::Name };
    (@via [seq]) => { $crate::FieldVia::Sequence };
    (@wire $f:ident [auto]) => { $crate::external_name(stringify!($f)) };
    (@wire $f:ident [w $w:literal]) => { $w };

    // Dictionary encode, one field.
    (@map_field ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [ign] $via:tt $def:tt) => {};
    (@map_field ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [ignp $p:literal] $via:tt $def:tt) => {
        if $pol.name() != Some($p) {
            $crate::record!(@map_entry ($slf) ($ser) ($pol) $f $wire $via);
        }
    };
    (@map_field ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [opt] $via:tt [$def:expr]) => {
        if $slf.$f != $def {
            $crate::record!(@map_entry ($slf) ($ser) ($pol) $f $wire $via);
        }
    };
    (@map_field ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [req] $via:tt $def:tt) => {
        $crate::record!(@map_entry ($slf) ($ser) ($pol) $f $wire $via);
    };
    (@map_entry ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [value]) => {{
        let name = $crate::record!(@wire $f $wire);
        $ser.begin_entry(name)?;
        $crate::map_value(&$slf.$f, $ser, $pol).map_err(|e| e.at(name))?;
    }};
    (@map_entry ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [by_name]) => {{
        let name = $crate::record!(@wire $f $wire);
        $ser.begin_entry(name)?;
        $crate::map_enum_member(&$slf.$f, $ser, $pol).map_err(|e| e.at(name))?;
    }};
    (@map_entry ($slf:expr) ($ser:expr) ($pol:expr) $f:ident $wire:tt [seq]) => {{
        let name = $crate::record!(@wire $f $wire);
        $ser.begin_entry(name)?;
        $crate::map_sequence_member(&$slf.$f, $ser, $pol).map_err(|e| e.at(name))?;
    }};

    // Dictionary decode, one key test inside the entry callback.
    (@unmap_arm ($de:expr) ($pol:expr) ($key:expr) $f:ident $wire:tt [ign] $via:tt) => {};
    (@unmap_arm ($de:expr) ($pol:expr) ($key:expr) $f:ident $wire:tt [ignp $p:literal] $via:tt) => {
        if $key == $crate::record!(@wire $f $wire) {
            if $pol.name() == Some($p) {
                return $de.skip_value();
            }
            $f = Some($crate::record!(@unmap_via ($de) ($pol) $via).map_err(|e| e.at($key))?);
            return Ok(());
        }
    };
    (@unmap_arm ($de:expr) ($pol:expr) ($key:expr) $f:ident $wire:tt $mode:tt $via:tt) => {
        if $key == $crate::record!(@wire $f $wire) {
            $f = Some($crate::record!(@unmap_via ($de) ($pol) $via).map_err(|e| e.at($key))?);
            return Ok(());
        }
    };
    (@unmap_via ($de:expr) ($pol:expr) [value]) => {
        $crate::unmap_value($de, $pol)
    };
    (@unmap_via ($de:expr) ($pol:expr) [by_name]) => {
        $crate::unmap_enum_member($de, $pol)
    };
    (@unmap_via ($de:expr) ($pol:expr) [seq]) => {
        $crate::unmap_sequence_member($de, $pol)
    };

    // Positional encode, one field.
    (@seq_map_field ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident [ign] $via:tt) => {};
    (@seq_map_field ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident [ignp $p:literal] $via:tt) => {
        if $pol.name() != Some($p) {
            $crate::record!(@seq_map_value ($slf) ($ser) ($pol) ($pos) $f $via);
            $pos += 1;
        }
    };
    (@seq_map_field ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident $mode:tt $via:tt) => {
        $crate::record!(@seq_map_value ($slf) ($ser) ($pol) ($pos) $f $via);
        $pos += 1;
    };
    (@seq_map_value ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident [value]) => {
        $crate::map_value(&$slf.$f, $ser, $pol).map_err(|e| e.at_index($pos))?;
    };
    (@seq_map_value ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident [by_name]) => {
        $crate::map_enum_member(&$slf.$f, $ser, $pol).map_err(|e| e.at_index($pos))?;
    };
    (@seq_map_value ($slf:expr) ($ser:expr) ($pol:expr) ($pos:ident) $f:ident [seq]) => {
        $crate::map_sequence_member(&$slf.$f, $ser, $pol).map_err(|e| e.at_index($pos))?;
    };

    // Positional decode, one slot test inside the element callback.
    (@seq_unmap_field ($de:expr) ($pol:expr) ($pos:ident) ($slot:ident) $f:ident [ign] $via:tt) => {};
    (@seq_unmap_field ($de:expr) ($pol:expr) ($pos:ident) ($slot:ident) $f:ident [ignp $p:literal] $via:tt) => {
        if $pol.name() != Some($p) {
            if $pos == $slot {
                $f = Some(
                    $crate::record!(@unmap_via ($de) ($pol) $via).map_err(|e| e.at_index($pos))?,
                );
                $pos += 1;
                return Ok(());
            }
            $slot += 1;
        }
    };
    (@seq_unmap_field ($de:expr) ($pol:expr) ($pos:ident) ($slot:ident) $f:ident $mode:tt $via:tt) => {
        if $pos == $slot {
            $f = Some(
                $crate::record!(@unmap_via ($de) ($pol) $via).map_err(|e| e.at_index($pos))?,
            );
            $pos += 1;
            return Ok(());
        }
        $slot += 1;
    };

    // Struct construction after decode.
    (@finish $f:ident $wire:tt [req] $def:tt) => {
        match $f {
            Some(value) => value,
            None => {
                return Err($crate::MapError::missing_field($crate::record!(@wire $f $wire)))
            }
        }
    };
    (@finish $f:ident $wire:tt $mode:tt [$def:expr]) => {
        $f.unwrap_or_else(|| $def)
    };
}

/// Declares a mappable C-like enumeration. See the [module docs](self).
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty { $($variant:ident $(= $val:expr)?),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant $(= $val)?,)+
        }

        impl $crate::Enumerated for $name {
            type Repr = $repr;

            const NAMES: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(_ if name == stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn to_repr(&self) -> $repr {
                *self as $repr
            }

            fn from_repr(value: $repr) -> Option<Self> {
                $(if value == $name::$variant as $repr {
                    return Some($name::$variant);
                })+
                None
            }
        }

        impl $crate::Mappable for $name {
            fn map(
                &self,
                ser: &mut dyn $crate::Serializer,
                policies: &$crate::Policies,
            ) -> Result<(), $crate::MapError> {
                $crate::map_value(&$crate::Enumerated::to_repr(self), ser, policies)
            }

            fn unmap(
                de: &mut dyn $crate::Deserializer,
                policies: &$crate::Policies,
            ) -> Result<Self, $crate::MapError> {
                let value: $repr = $crate::unmap_value(de, policies)?;
                <$name as $crate::Enumerated>::from_repr(value).ok_or_else(|| {
                    $crate::MapError::UnknownName {
                        kind: "enum discriminant",
                        name: value.to_string(),
                    }
                })
            }
        }

        impl $crate::MapKey for $name {
            fn to_key(&self) -> String {
                $crate::Enumerated::name(self).to_owned()
            }

            fn from_key(key: &str) -> Result<Self, $crate::MapError> {
                <$name as $crate::Enumerated>::from_name(key).ok_or_else(|| {
                    $crate::MapError::UnknownName {
                        kind: "enum variant",
                        name: key.to_owned(),
                    }
                })
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident $(= $val:expr)?),+ $(,)? }
    ) => {
        $crate::enumeration! {
            $(#[$meta])*
            $vis enum $name : i32 { $($variant $(= $val)?),+ }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::testutil::{from_tree, to_tree, Node};
    use crate::{Enumerated, MapError, Policies, Record, Scalar};

    enumeration! {
        enum Element: i32 { Fire = 1, Water, Earth }
    }

    record! {
        #[sequence]
        struct Position {
            x: f64,
            y: f64,
        }
    }

    record! {
        struct Monster {
            name: String,
            optional level as "lvl": u32 = 1,
            ignore cached: u64,
            ignore("public") secret: String,
            by_name element: Element,
            as_sequence pos: Position,
            type_: String,
        }
    }

    record! {
        struct Pair {
            a: String,
            b: i32,
        }
    }

    fn monster() -> Monster {
        Monster {
            name: "imp".to_owned(),
            level: 3,
            cached: 0,
            secret: "weak to water".to_owned(),
            element: Element::Fire,
            pos: Position { x: 1.5, y: -2.0 },
            type_: "demon".to_owned(),
        }
    }

    fn entry<'a>(node: &'a Node, key: &str) -> Option<&'a Node> {
        match node {
            Node::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    #[test]
    fn record_roundtrip_with_directives() {
        let value = monster();
        let tree = to_tree(&value, &Policies::new());

        assert_eq!(
            entry(&tree, "name"),
            Some(&Node::Scalar(Scalar::Str("imp".to_owned())))
        );
        // Renamed, and present because it differs from the default.
        assert_eq!(entry(&tree, "lvl"), Some(&Node::Scalar(Scalar::Int64(3))));
        assert_eq!(entry(&tree, "level"), None);
        assert_eq!(entry(&tree, "cached"), None);
        // Enumeration field written by name, not discriminant.
        assert_eq!(
            entry(&tree, "element"),
            Some(&Node::Scalar(Scalar::Str("Fire".to_owned())))
        );
        // Nested record forced positional.
        assert_eq!(
            entry(&tree, "pos"),
            Some(&Node::Array(vec![
                Node::Scalar(Scalar::Float(1.5)),
                Node::Scalar(Scalar::Float(-2.0)),
            ]))
        );
        // Trailing underscore stripped.
        assert!(entry(&tree, "type").is_some());
        assert_eq!(entry(&tree, "type_"), None);

        let back: Monster = from_tree(&tree, &Policies::new()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn optional_equal_to_default_is_omitted() {
        let mut value = monster();
        value.level = 1;
        let tree = to_tree(&value, &Policies::new());
        assert_eq!(entry(&tree, "lvl"), None);

        let back: Monster = from_tree(&tree, &Policies::new()).unwrap();
        assert_eq!(back.level, 1);
    }

    #[test]
    fn policy_conditioned_ignore() {
        let public = Policies::named("public");
        let tree = to_tree(&monster(), &public);
        assert_eq!(entry(&tree, "secret"), None);

        // A present value for the suppressed field is skipped on decode.
        let full = to_tree(&monster(), &Policies::new());
        assert!(entry(&full, "secret").is_some());
        let back: Monster = from_tree(&full, &public).unwrap();
        assert_eq!(back.secret, "");
    }

    #[test]
    fn missing_required_field_reports_path() {
        let tree = Node::Dict(vec![(
            "a".to_owned(),
            Node::Scalar(Scalar::Str("x".to_owned())),
        )]);
        let err = from_tree::<Pair>(&tree, &Policies::new()).unwrap_err();
        match err {
            MapError::Decode { path, message } => {
                assert_eq!(path, "b");
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_skipped_and_duplicates_win_last() {
        let tree = Node::Dict(vec![
            ("junk".to_owned(), Node::Array(vec![])),
            ("a".to_owned(), Node::Scalar(Scalar::Str("x".to_owned()))),
            ("b".to_owned(), Node::Scalar(Scalar::Int32(1))),
            ("b".to_owned(), Node::Scalar(Scalar::Int32(2))),
        ]);
        let pair: Pair = from_tree(&tree, &Policies::new()).unwrap();
        assert_eq!(pair.b, 2);
    }

    #[test]
    fn sequence_record_shape() {
        let pos = Position { x: 0.5, y: 4.0 };
        let tree = to_tree(&pos, &Policies::new());
        assert_eq!(
            tree,
            Node::Array(vec![
                Node::Scalar(Scalar::Float(0.5)),
                Node::Scalar(Scalar::Float(4.0)),
            ])
        );
        assert_eq!(from_tree::<Position>(&tree, &Policies::new()).unwrap(), pos);

        let short = Node::Array(vec![Node::Scalar(Scalar::Float(0.5))]);
        assert!(matches!(
            from_tree::<Position>(&short, &Policies::new()),
            Err(MapError::LengthMismatch {
                expected: 2,
                found: 1
            })
        ));
        let long = Node::Array(vec![
            Node::Scalar(Scalar::Float(0.5)),
            Node::Scalar(Scalar::Float(1.0)),
            Node::Scalar(Scalar::Float(2.0)),
        ]);
        assert!(matches!(
            from_tree::<Position>(&long, &Policies::new()),
            Err(MapError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn enumeration_maps_through_discriminant() {
        assert_eq!(Element::NAMES, &["Fire", "Water", "Earth"]);
        assert_eq!(Element::Water.to_repr(), 2);

        let tree = to_tree(&Element::Earth, &Policies::new());
        assert_eq!(tree, Node::Scalar(Scalar::Int32(3)));
        assert_eq!(
            from_tree::<Element>(&tree, &Policies::new()).unwrap(),
            Element::Earth
        );

        let bogus = Node::Scalar(Scalar::Int32(99));
        assert!(matches!(
            from_tree::<Element>(&bogus, &Policies::new()),
            Err(MapError::UnknownName { kind: "enum discriminant", .. })
        ));
    }

    #[test]
    fn field_table_reflects_directives() {
        use crate::{FieldMode, FieldVia, WireName};
        let fields = Monster::FIELDS;
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[1].wire, WireName::Explicit("lvl"));
        assert_eq!(fields[1].mode, FieldMode::Optional);
        assert_eq!(fields[3].mode, FieldMode::IgnoredFor("public"));
        assert_eq!(fields[4].via, FieldVia::Name);
        assert_eq!(fields[5].via, FieldVia::Sequence);
        assert_eq!(fields[6].wire.resolve(), "type");
    }

    #[test]
    fn representation_policy_swaps_the_wire_form() {
        let policies = Policies::new().represent::<u32, String>(
            |v| format!("#{v}"),
            |s| s.trim_start_matches('#').parse().unwrap_or(0),
        );
        let tree = to_tree(&42u32, &policies);
        assert_eq!(tree, Node::Scalar(Scalar::Str("#42".to_owned())));
        assert_eq!(from_tree::<u32>(&tree, &policies).unwrap(), 42);

        // The same mapping without the policy keeps the native form.
        assert_eq!(
            to_tree(&42u32, &Policies::new()),
            Node::Scalar(Scalar::Int64(42))
        );
    }

    #[test]
    fn record_policy_round_trips_through_its_representation() {
        let policies = Policies::new().represent::<Pair, String>(
            |p| format!("{}={}", p.a, p.b),
            |s| {
                let (a, b) = s.split_once('=').unwrap_or(("", "0"));
                Pair {
                    a: a.to_owned(),
                    b: b.parse().unwrap_or(0),
                }
            },
        );

        let pair = Pair {
            a: "k".to_owned(),
            b: 7,
        };
        let tree = to_tree(&pair, &policies);
        // The backend only ever sees the string form, never a dictionary.
        assert_eq!(tree, Node::Scalar(Scalar::Str("k=7".to_owned())));
        assert_eq!(from_tree::<Pair>(&tree, &policies).unwrap(), pair);
    }

    #[test]
    fn member_policies_take_precedence_over_directives() {
        let policies = Policies::new()
            .represent::<Element, String>(
                |e| format!("elem:{}", e.name()),
                |s| Element::from_name(s.trim_start_matches("elem:")).unwrap_or(Element::Fire),
            )
            .represent::<Position, String>(
                |p| format!("{};{}", p.x, p.y),
                |s| {
                    let (x, y) = s.split_once(';').unwrap_or(("0", "0"));
                    Position {
                        x: x.parse().unwrap_or(0.0),
                        y: y.parse().unwrap_or(0.0),
                    }
                },
            );

        let value = monster();
        let tree = to_tree(&value, &policies);
        // `by_name` and `as_sequence` members defer to registered policies.
        assert_eq!(
            entry(&tree, "element"),
            Some(&Node::Scalar(Scalar::Str("elem:Fire".to_owned())))
        );
        assert_eq!(
            entry(&tree, "pos"),
            Some(&Node::Scalar(Scalar::Str("1.5;-2".to_owned())))
        );

        let back: Monster = from_tree(&tree, &policies).unwrap();
        assert_eq!(back, value);
    }
}
