//! Type metadata: declarations, resolved attributes and templates.
//!
//! A domain type declares its structure once through [`Declare`](crate::traits::Declare).
//! The [`TemplateCache`] turns that declaration, together with any
//! [`ClassConfiguration`], into an immutable [`ClassTemplate`].

pub(crate) mod attribute;
pub(crate) mod backing_field;
pub(crate) mod cache;
pub(crate) mod class;
pub(crate) mod configuration;
pub(crate) mod declaration;
pub(crate) mod member;
pub(crate) mod tracking;

#[cfg(test)]
mod tests;

use crate::{types::TypeKey, value::ScalarKind};
use std::sync::Arc;

// re-exports
pub use attribute::{
    Attribute, AttributeEntry, AttributeKind, AttributeMap, AttributeSource, Relationship,
};
pub use cache::TemplateCache;
pub use class::{ClassTemplate, CollectionTemplate, ValueTemplate};
pub use configuration::{ClassConfiguration, ClassConfigurations};
pub use declaration::{
    ClassDeclaration, FieldDeclaration, MethodDeclaration, ParameterDeclaration,
    PropertyDeclaration,
};
pub use member::{MethodTemplate, ParameterTemplate, PropertyTemplate};

///
/// TemplateKey
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TemplateKey {
    Class(TypeKey),
    Collection(TypeKey),
    Value(ScalarKind),
}

///
/// Template
///
/// Any resolved template: a class, a collection of a class, or a scalar.
///

#[derive(Clone, Debug)]
pub enum Template {
    Class(Arc<ClassTemplate>),
    Collection(Arc<CollectionTemplate>),
    Value(Arc<ValueTemplate>),
}

impl Template {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Class(template) => template.name().to_string(),
            Self::Collection(template) => template.name().to_string(),
            Self::Value(template) => template.name(),
        }
    }

    #[must_use]
    pub const fn as_class(&self) -> Option<&Arc<ClassTemplate>> {
        match self {
            Self::Class(template) => Some(template),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}
