#[cfg(test)]
mod tests;

use crate::{
    traits::{Declare, MemberError},
    types::{CollectionRef, ObjectRef, TypeKey},
};
use std::{
    fmt,
    hash::{Hash, Hasher},
};
use ulid::Ulid;

///
/// ScalarKind
///
/// Kinds of non-reference values. Scalars are tracked by value, never by identity.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
    Text,
    Ulid,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Text => "text",
            Self::Ulid => "ulid",
        };
        write!(f, "{label}")
    }
}

///
/// ValueKind
///
/// Declared kind of a property, parameter or return value.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueKind {
    Scalar(ScalarKind),
    Object(TypeKey),
    Collection(TypeKey),
}

impl ValueKind {
    pub const BOOL: Self = Self::Scalar(ScalarKind::Bool);
    pub const INT: Self = Self::Scalar(ScalarKind::Int);
    pub const UINT: Self = Self::Scalar(ScalarKind::Uint);
    pub const FLOAT: Self = Self::Scalar(ScalarKind::Float);
    pub const TEXT: Self = Self::Scalar(ScalarKind::Text);
    pub const ULID: Self = Self::Scalar(ScalarKind::Ulid);

    #[must_use]
    pub fn object<T: Declare>() -> Self {
        Self::Object(TypeKey::of::<T>())
    }

    #[must_use]
    pub fn collection<T: Declare>() -> Self {
        Self::Collection(TypeKey::of::<T>())
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// The referenced domain type, for object and collection kinds.
    #[must_use]
    pub const fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::Scalar(_) => None,
            Self::Object(key) | Self::Collection(key) => Some(*key),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Object(key) => write!(f, "object<{}>", key.short_name()),
            Self::Collection(key) => write!(f, "collection<{}>", key.short_name()),
        }
    }
}

///
/// Value
///
/// Dynamic value exchanged with domain objects.
/// Object and collection variants compare by reference identity.
///

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Ulid(Ulid),
    Object(ObjectRef),
    Collection(CollectionRef),
}

impl Value {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for values that are compared and cached by value.
    #[must_use]
    pub const fn is_non_reference(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::Collection(_))
    }

    #[must_use]
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Bool(_) => Some(ScalarKind::Bool),
            Self::Int(_) => Some(ScalarKind::Int),
            Self::Uint(_) => Some(ScalarKind::Uint),
            Self::Float(_) => Some(ScalarKind::Float),
            Self::Text(_) => Some(ScalarKind::Text),
            Self::Ulid(_) => Some(ScalarKind::Ulid),
            Self::Null | Self::Object(_) | Self::Collection(_) => None,
        }
    }

    /// Whether this value may be stored in a member of the given kind.
    /// Null is accepted by every kind.
    #[must_use]
    pub fn matches(&self, kind: &ValueKind) -> bool {
        match (self, kind) {
            (Self::Null, _) => true,
            (Self::Object(obj), ValueKind::Object(key)) => obj.type_key() == *key,
            (Self::Collection(coll), ValueKind::Collection(key)) => coll.element_type() == *key,
            (value, ValueKind::Scalar(scalar)) => value.scalar_kind() == Some(*scalar),
            _ => false,
        }
    }

    /// Short label describing the runtime kind, used in error messages.
    #[must_use]
    pub fn kind_label(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Object(obj) => format!("object<{}>", obj.type_key().short_name()),
            Self::Collection(coll) => format!("collection<{}>", coll.element_type().short_name()),
            other => other
                .scalar_kind()
                .map_or_else(|| "unknown".to_string(), |kind| kind.to_string()),
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Self::Collection(coll) => Some(coll),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert into a concrete Rust type on behalf of a domain member.
    pub fn cast<T: FromValue>(self, member: &str) -> Result<T, MemberError> {
        let label = self.kind_label();

        T::from_value(self).ok_or_else(|| MemberError::InvalidValue {
            member: member.to_string(),
            actual: label,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Ulid(a), Self::Ulid(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Collection(a), Self::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Uint(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
            Self::Ulid(v) => v.hash(state),
            Self::Object(v) => v.address().hash(state),
            Self::Collection(v) => v.address().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Ulid(v) => write!(f, "{v}"),
            Self::Object(v) => write!(f, "{v:?}"),
            Self::Collection(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i64 => Int,
    u64 => Uint,
    f64 => Float,
    String => Text,
    Ulid => Ulid,
    ObjectRef => Object,
    CollectionRef => Collection,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

///
/// FromValue
///
/// Conversion out of a dynamic [`Value`]; `None` means the kind did not match.
///

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
