use crate::{config::IntrospectionConfig, error::ConfigurationError, value::ValueKind};
use indexmap::IndexMap;
use std::fmt;

///
/// Attribute
///
/// Declarative behaviour attached to a class or member.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Attribute {
    Persistable(bool),
    Creatable(bool),
    Visible(bool),
    Key,
    ConcurrencyCheck,
    Audit,
    Relationship(Relationship),
    AllowedOperations { can_read: bool, can_write: bool },
    Required(bool),
    MaxLength(usize),
    MinLength(usize),
    BackingField(String),
    DisplayName(String),
}

impl Attribute {
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        match self {
            Self::Persistable(_) => AttributeKind::Persistable,
            Self::Creatable(_) => AttributeKind::Creatable,
            Self::Visible(_) => AttributeKind::Visible,
            Self::Key => AttributeKind::Key,
            Self::ConcurrencyCheck => AttributeKind::ConcurrencyCheck,
            Self::Audit => AttributeKind::Audit,
            Self::Relationship(_) => AttributeKind::Relationship,
            Self::AllowedOperations { .. } => AttributeKind::AllowedOperations,
            Self::Required(_) => AttributeKind::Required,
            Self::MaxLength(_) => AttributeKind::MaxLength,
            Self::MinLength(_) => AttributeKind::MinLength,
            Self::BackingField(_) => AttributeKind::BackingField,
            Self::DisplayName(_) => AttributeKind::DisplayName,
        }
    }

    #[must_use]
    pub const fn read_only() -> Self {
        Self::AllowedOperations {
            can_read: true,
            can_write: false,
        }
    }
}

///
/// AttributeKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeKind {
    Persistable,
    Creatable,
    Visible,
    Key,
    ConcurrencyCheck,
    Audit,
    Relationship,
    AllowedOperations,
    Required,
    MaxLength,
    MinLength,
    BackingField,
    DisplayName,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Persistable => "persistable",
            Self::Creatable => "creatable",
            Self::Visible => "visible",
            Self::Key => "key",
            Self::ConcurrencyCheck => "concurrency_check",
            Self::Audit => "audit",
            Self::Relationship => "relationship",
            Self::AllowedOperations => "allowed_operations",
            Self::Required => "required",
            Self::MaxLength => "max_length",
            Self::MinLength => "min_length",
            Self::BackingField => "backing_field",
            Self::DisplayName => "display_name",
        };
        write!(f, "{label}")
    }
}

///
/// Relationship
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Relationship {
    #[default]
    Has,
    Owns,
    OwnedBy,
}

///
/// AttributeSource
/// Where a resolved attribute came from.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeSource {
    Declaration,
    Configuration,
    Default,
    Framework,
}

///
/// AttributeEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeEntry {
    pub attribute: Attribute,
    pub source: AttributeSource,
}

///
/// AttributeTarget
/// The member an attribute map is being resolved for.
///

#[derive(Clone, Copy, Debug)]
pub enum AttributeTarget {
    Class { is_entity: bool },
    Property(ValueKind),
    Method,
    Parameter(ValueKind),
}

///
/// MissingAttributeBuilder
///
/// Supplies a default for every attribute kind a member did not declare.
///

pub(crate) struct MissingAttributeBuilder<'a> {
    config: &'a IntrospectionConfig,
}

impl<'a> MissingAttributeBuilder<'a> {
    pub(crate) const fn new(config: &'a IntrospectionConfig) -> Self {
        Self { config }
    }

    fn defaulted_kinds(target: AttributeTarget) -> &'static [AttributeKind] {
        match target {
            AttributeTarget::Class { .. } => &[
                AttributeKind::Persistable,
                AttributeKind::Creatable,
                AttributeKind::Visible,
            ],
            AttributeTarget::Property(ValueKind::Scalar(_)) => &[
                AttributeKind::Visible,
                AttributeKind::AllowedOperations,
                AttributeKind::Required,
                AttributeKind::MaxLength,
                AttributeKind::MinLength,
            ],
            AttributeTarget::Property(_) => &[
                AttributeKind::Visible,
                AttributeKind::AllowedOperations,
                AttributeKind::Required,
                AttributeKind::Relationship,
            ],
            AttributeTarget::Method => &[AttributeKind::Visible],
            AttributeTarget::Parameter(_) => &[
                AttributeKind::Visible,
                AttributeKind::Required,
                AttributeKind::MaxLength,
                AttributeKind::MinLength,
            ],
        }
    }

    fn build(&self, kind: AttributeKind, target: AttributeTarget) -> Option<Attribute> {
        let attribute = match kind {
            AttributeKind::Persistable => match target {
                AttributeTarget::Class { is_entity } => Attribute::Persistable(is_entity),
                _ => return None,
            },
            AttributeKind::Creatable => Attribute::Creatable(true),
            AttributeKind::Visible => Attribute::Visible(true),
            AttributeKind::AllowedOperations => Attribute::AllowedOperations {
                can_read: true,
                can_write: true,
            },
            AttributeKind::Required => {
                Attribute::Required(matches!(target, AttributeTarget::Parameter(_)))
            }
            AttributeKind::MaxLength => Attribute::MaxLength(self.config.default_max_length),
            AttributeKind::MinLength => Attribute::MinLength(self.config.default_min_length),
            AttributeKind::Relationship => Attribute::Relationship(Relationship::default()),
            _ => return None,
        };

        Some(attribute)
    }
}

///
/// AttributeMap
///
/// Resolved attributes of one class or member.
/// Configuration overrides declaration; defaults fill whatever is left.
///

#[derive(Clone, Debug, Default)]
pub struct AttributeMap {
    entries: IndexMap<AttributeKind, AttributeEntry>,
}

impl AttributeMap {
    pub(crate) fn build(
        owner: &str,
        target: AttributeTarget,
        declared: &[Attribute],
        configured: &[Attribute],
        defaults: &MissingAttributeBuilder<'_>,
    ) -> Result<Self, ConfigurationError> {
        let mut map = Self::default();

        map.merge(owner, declared, AttributeSource::Declaration)?;
        map.merge(owner, configured, AttributeSource::Configuration)?;

        for kind in MissingAttributeBuilder::defaulted_kinds(target) {
            if !map.entries.contains_key(kind)
                && let Some(attribute) = defaults.build(*kind, target)
            {
                map.entries.insert(
                    *kind,
                    AttributeEntry {
                        attribute,
                        source: AttributeSource::Default,
                    },
                );
            }
        }

        Ok(map)
    }

    // Repeating an identical attribute is tolerated, contradicting it is not.
    // A later source replaces an earlier one outright.
    fn merge(
        &mut self,
        owner: &str,
        attributes: &[Attribute],
        source: AttributeSource,
    ) -> Result<(), ConfigurationError> {
        let mut seen: IndexMap<AttributeKind, &Attribute> = IndexMap::new();

        for attribute in attributes {
            let kind = attribute.kind();
            if let Some(previous) = seen.insert(kind, attribute)
                && previous != attribute
            {
                return Err(ConfigurationError::ConflictingAttribute {
                    owner: owner.to_string(),
                    attribute: kind.to_string(),
                });
            }
        }

        for (kind, attribute) in seen {
            self.entries.insert(
                kind,
                AttributeEntry {
                    attribute: attribute.clone(),
                    source,
                },
            );
        }

        Ok(())
    }

    /// Override an attribute regardless of how it was declared.
    pub(crate) fn force(&mut self, attribute: Attribute) {
        self.entries.insert(
            attribute.kind(),
            AttributeEntry {
                attribute,
                source: AttributeSource::Framework,
            },
        );
    }

    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.entries.get(&kind).map(|entry| &entry.attribute)
    }

    #[must_use]
    pub fn entry(&self, kind: AttributeKind) -> Option<&AttributeEntry> {
        self.entries.get(&kind)
    }

    #[must_use]
    pub fn has(&self, kind: AttributeKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.values()
    }

    fn flag(&self, kind: AttributeKind) -> bool {
        matches!(
            self.get(kind),
            Some(
                Attribute::Persistable(true)
                    | Attribute::Creatable(true)
                    | Attribute::Visible(true)
                    | Attribute::Required(true)
            )
        )
    }

    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.flag(AttributeKind::Persistable)
    }

    #[must_use]
    pub fn is_creatable(&self) -> bool {
        self.flag(AttributeKind::Creatable)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flag(AttributeKind::Visible)
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.flag(AttributeKind::Required)
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        match self.get(AttributeKind::AllowedOperations) {
            Some(Attribute::AllowedOperations { can_read, .. }) => *can_read,
            _ => true,
        }
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        match self.get(AttributeKind::AllowedOperations) {
            Some(Attribute::AllowedOperations { can_write, .. }) => *can_write,
            _ => true,
        }
    }

    #[must_use]
    pub fn relationship(&self) -> Option<Relationship> {
        match self.get(AttributeKind::Relationship) {
            Some(Attribute::Relationship(relationship)) => Some(*relationship),
            _ => None,
        }
    }

    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        match self.get(AttributeKind::MaxLength) {
            Some(Attribute::MaxLength(len)) => Some(*len),
            _ => None,
        }
    }

    #[must_use]
    pub fn min_length(&self) -> Option<usize> {
        match self.get(AttributeKind::MinLength) {
            Some(Attribute::MinLength(len)) => Some(*len),
            _ => None,
        }
    }

    #[must_use]
    pub fn backing_field(&self) -> Option<&str> {
        match self.get(AttributeKind::BackingField) {
            Some(Attribute::BackingField(name)) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self.get(AttributeKind::DisplayName) {
            Some(Attribute::DisplayName(name)) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        target: AttributeTarget,
        declared: &[Attribute],
        configured: &[Attribute],
    ) -> Result<AttributeMap, ConfigurationError> {
        let config = IntrospectionConfig::default();
        AttributeMap::build(
            "Customer.name",
            target,
            declared,
            configured,
            &MissingAttributeBuilder::new(&config),
        )
    }

    #[test]
    fn scalar_property_defaults_are_filled() {
        let map = build(AttributeTarget::Property(ValueKind::TEXT), &[], &[])
            .expect("empty declarations should resolve");

        assert!(map.can_read());
        assert!(map.can_write());
        assert!(map.is_visible());
        assert!(!map.is_required());
        assert_eq!(map.max_length(), Some(2000));
        assert_eq!(map.min_length(), Some(0));
        assert_eq!(map.relationship(), None);
        assert_eq!(
            map.entry(AttributeKind::MaxLength).map(|e| e.source),
            Some(AttributeSource::Default)
        );
    }

    #[test]
    fn reference_property_defaults_to_has() {
        let kind = ValueKind::collection::<crate::test_fixtures::Order>();
        let map = build(AttributeTarget::Property(kind), &[], &[])
            .expect("empty declarations should resolve");

        assert_eq!(map.relationship(), Some(Relationship::Has));
        assert_eq!(map.max_length(), None);
    }

    #[test]
    fn parameters_are_required_by_default() {
        let map = build(AttributeTarget::Parameter(ValueKind::INT), &[], &[])
            .expect("empty declarations should resolve");

        assert!(map.is_required());
    }

    #[test]
    fn configuration_overrides_declaration() {
        let map = build(
            AttributeTarget::Property(ValueKind::TEXT),
            &[Attribute::MaxLength(10)],
            &[Attribute::MaxLength(20)],
        )
        .expect("override should resolve");

        assert_eq!(map.max_length(), Some(20));
        assert_eq!(
            map.entry(AttributeKind::MaxLength).map(|e| e.source),
            Some(AttributeSource::Configuration)
        );
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let err = build(
            AttributeTarget::Property(ValueKind::TEXT),
            &[Attribute::MaxLength(10), Attribute::MaxLength(11)],
            &[],
        )
        .expect_err("conflicting declarations should fail");

        assert_eq!(
            err,
            ConfigurationError::ConflictingAttribute {
                owner: "Customer.name".to_string(),
                attribute: "max_length".to_string(),
            }
        );
    }

    #[test]
    fn identical_repeats_are_tolerated() {
        let map = build(
            AttributeTarget::Property(ValueKind::TEXT),
            &[Attribute::Required(true), Attribute::Required(true)],
            &[],
        )
        .expect("identical repeats should resolve");

        assert!(map.is_required());
    }

    #[test]
    fn class_persistability_defaults_to_entity_flag() {
        let entity = build(AttributeTarget::Class { is_entity: true }, &[], &[])
            .expect("class should resolve");
        let plain = build(AttributeTarget::Class { is_entity: false }, &[], &[])
            .expect("class should resolve");

        assert!(entity.is_persistable());
        assert!(!plain.is_persistable());
        assert!(plain.is_creatable());
    }

    #[test]
    fn force_marks_framework_source() {
        let mut map = build(AttributeTarget::Property(ValueKind::ULID), &[], &[])
            .expect("property should resolve");
        map.force(Attribute::read_only());

        assert!(!map.can_write());
        assert_eq!(
            map.entry(AttributeKind::AllowedOperations).map(|e| e.source),
            Some(AttributeSource::Framework)
        );
    }
}
