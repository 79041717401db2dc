//! Record shapes: compile-time field tables shared by the `record!`
//! macro expansion and reflection-style consumers.

use crate::backend::{Deserializer, Serializer};
use crate::error::MapError;
use crate::policy::Policies;

/// How a record field participates in mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Present on the wire; missing on decode is an error.
    Required,
    /// Skipped on encode when equal to its default; defaulted on decode
    /// when absent.
    Optional,
    /// Never on the wire; always defaulted on decode.
    Ignored,
    /// Ignored only under the named policy set.
    IgnoredFor(&'static str),
}

/// How a field's value travels across the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldVia {
    /// The type's own `Mappable` implementation.
    Value,
    /// Enumeration fields written as the symbolic variant name.
    Name,
    /// Nested record written positionally instead of as a dictionary.
    Sequence,
}

/// External name of a field.
///
/// Stored unresolved so the field table stays `const`; resolution strips
/// the keyword-collision underscore (`type_` becomes `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireName {
    /// Derived from the field identifier.
    Auto(&'static str),
    /// Set by an `as "..."` directive.
    Explicit(&'static str),
}

impl WireName {
    pub fn resolve(&self) -> &'static str {
        match self {
            WireName::Auto(field) => external_name(field),
            WireName::Explicit(wire) => wire,
        }
    }
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust-side field identifier.
    pub field: &'static str,
    /// External name used on the wire.
    pub wire: WireName,
    pub mode: FieldMode,
    pub via: FieldVia,
}

impl FieldDef {
    /// Whether the field is off the wire under the given policy set.
    pub fn is_ignored(&self, policies: &Policies) -> bool {
        match self.mode {
            FieldMode::Ignored => true,
            FieldMode::IgnoredFor(name) => policies.name() == Some(name),
            _ => false,
        }
    }
}

/// A dictionary-shaped aggregate, as emitted by the `record!` macro.
pub trait Record {
    /// Type name as declared, for error messages.
    const NAME: &'static str;
    /// All fields in declaration order, ignored ones included.
    const FIELDS: &'static [FieldDef];
}

/// The positional wire form of a record: fields travel as an array in
/// declaration order, ignored ones omitted.
///
/// `record!` emits this for every record, so any record field can opt in
/// through the `as_sequence` directive; records declared `#[sequence]`
/// use it as their only form.
pub trait SequenceRecord: Record + Sized {
    /// Number of elements the wire form carries under `policies`.
    fn sequence_len(policies: &Policies) -> usize {
        Self::FIELDS
            .iter()
            .filter(|f| !f.is_ignored(policies))
            .count()
    }

    fn map_sequence(
        &self,
        ser: &mut dyn Serializer,
        policies: &Policies,
    ) -> Result<(), MapError>;

    fn unmap_sequence(de: &mut dyn Deserializer, policies: &Policies) -> Result<Self, MapError>;
}

/// Derives the external name for a field identifier: a trailing
/// underscore (the keyword-collision convention, e.g. `type_`) is
/// stripped.
pub fn external_name(field: &'static str) -> &'static str {
    field.strip_suffix('_').unwrap_or(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_name_strips_keyword_escape() {
        assert_eq!(external_name("type_"), "type");
        assert_eq!(external_name("name"), "name");
        assert_eq!(WireName::Auto("type_").resolve(), "type");
        assert_eq!(WireName::Explicit("lvl").resolve(), "lvl");
    }

    #[test]
    fn policy_conditioned_ignore() {
        let def = FieldDef {
            field: "secret",
            wire: WireName::Auto("secret"),
            mode: FieldMode::IgnoredFor("public"),
            via: FieldVia::Value,
        };
        assert!(def.is_ignored(&Policies::named("public")));
        assert!(!def.is_ignored(&Policies::new()));
        assert!(!def.is_ignored(&Policies::named("internal")));
    }
}
