use crate::{
    memo::Memo,
    model::{
        attribute::{AttributeMap, Relationship},
        backing_field::BackingFieldIdentifier,
        declaration::FieldDeclaration,
    },
    value::{Value, ValueKind},
};
use indexmap::IndexMap;
use std::sync::Arc;

///
/// PropertyTemplate
///
/// Resolved metadata for one property of a class.
///

#[derive(Debug)]
pub struct PropertyTemplate {
    owner: String,
    name: String,
    kind: ValueKind,
    pub(crate) attributes: AttributeMap,
    pub(crate) is_framework: bool,
    fields: Arc<[FieldDeclaration]>,
    backing_field: Memo<Option<String>>,
}

impl PropertyTemplate {
    pub(crate) fn new(
        owner: &str,
        name: &str,
        kind: ValueKind,
        attributes: AttributeMap,
        fields: Arc<[FieldDeclaration]>,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            kind,
            attributes,
            is_framework: false,
            fields,
            backing_field: Memo::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the declaring class.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    #[must_use]
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    #[must_use]
    pub const fn is_domain_object(&self) -> bool {
        self.kind.is_object()
    }

    #[must_use]
    pub const fn is_non_reference(&self) -> bool {
        self.kind.is_scalar()
    }

    /// Id, version and audit members managed by the engine.
    #[must_use]
    pub const fn is_framework(&self) -> bool {
        self.is_framework
    }

    #[must_use]
    pub fn relationship(&self) -> Option<Relationship> {
        self.attributes.relationship()
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.attributes.can_read()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.attributes.can_write()
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.attributes.is_required()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.attributes.is_visible()
    }

    #[must_use]
    pub fn backing_field_name(&self) -> Option<&str> {
        self.backing_field
            .get_or_init(|| {
                BackingFieldIdentifier::identify(
                    &self.name,
                    &self.kind,
                    self.attributes.backing_field(),
                    &self.fields,
                )
            })
            .as_deref()
    }

    pub(crate) fn accepts(&self, value: &Value) -> bool {
        value.matches(&self.kind)
    }
}

///
/// ParameterTemplate
///

#[derive(Debug)]
pub struct ParameterTemplate {
    name: String,
    kind: ValueKind,
    position: usize,
    pub(crate) attributes: AttributeMap,
}

impl ParameterTemplate {
    pub(crate) fn new(
        name: &str,
        kind: ValueKind,
        position: usize,
        attributes: AttributeMap,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            position,
            attributes,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &ValueKind {
        &self.kind
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.attributes.is_required()
    }

    #[must_use]
    pub const fn is_domain_object(&self) -> bool {
        self.kind.is_object()
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.kind.is_collection()
    }

    #[must_use]
    pub const fn is_non_reference(&self) -> bool {
        self.kind.is_scalar()
    }
}

///
/// MethodTemplate
///

#[derive(Debug)]
pub struct MethodTemplate {
    owner: String,
    name: String,
    is_static: bool,
    returns: Option<ValueKind>,
    parameters: IndexMap<String, Arc<ParameterTemplate>>,
    pub(crate) attributes: AttributeMap,
}

impl MethodTemplate {
    pub(crate) fn new(
        owner: &str,
        name: &str,
        is_static: bool,
        returns: Option<ValueKind>,
        parameters: IndexMap<String, Arc<ParameterTemplate>>,
        attributes: AttributeMap,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            is_static,
            returns,
            parameters,
            attributes,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub const fn returns(&self) -> Option<&ValueKind> {
        self.returns.as_ref()
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &Arc<ParameterTemplate>> {
        self.parameters.values()
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Arc<ParameterTemplate>> {
        self.parameters.get(name)
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}
