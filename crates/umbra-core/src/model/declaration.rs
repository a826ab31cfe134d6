use crate::{model::attribute::Attribute, types::ObjectRef, value::ValueKind};

///
/// ClassDeclaration
///
/// Static structure a domain type declares about itself.
/// Built with chained calls and turned into a `ClassTemplate` on first lookup.
///

#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    pub(crate) name: String,
    pub(crate) is_entity: bool,
    pub(crate) is_value_object: bool,
    pub(crate) is_aggregate_root: bool,
    pub(crate) is_abstract: bool,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) properties: Vec<PropertyDeclaration>,
    pub(crate) methods: Vec<MethodDeclaration>,
    pub(crate) static_methods: Vec<MethodDeclaration>,
    pub(crate) fields: Vec<FieldDeclaration>,
    pub(crate) constructor: Option<fn() -> ObjectRef>,
}

impl ClassDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_entity: false,
            is_value_object: false,
            is_aggregate_root: false,
            is_abstract: false,
            attributes: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            fields: Vec::new(),
            constructor: None,
        }
    }

    #[must_use]
    pub const fn entity(mut self) -> Self {
        self.is_entity = true;
        self
    }

    #[must_use]
    pub const fn value_object(mut self) -> Self {
        self.is_value_object = true;
        self
    }

    #[must_use]
    pub const fn aggregate_root(mut self) -> Self {
        self.is_entity = true;
        self.is_aggregate_root = true;
        self
    }

    #[must_use]
    pub const fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDeclaration) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn static_method(mut self, method: MethodDeclaration) -> Self {
        self.static_methods.push(method);
        self
    }

    /// Declare a storage field; used to resolve property backing fields.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            kind,
        });
        self
    }

    /// Default constructor used when the engine creates new instances.
    #[must_use]
    pub const fn constructor(mut self, constructor: fn() -> ObjectRef) -> Self {
        self.constructor = Some(constructor);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

///
/// PropertyDeclaration
///

#[derive(Clone, Debug)]
pub struct PropertyDeclaration {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) attributes: Vec<Attribute>,
}

impl PropertyDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

///
/// MethodDeclaration
///

#[derive(Clone, Debug)]
pub struct MethodDeclaration {
    pub(crate) name: String,
    pub(crate) parameters: Vec<ParameterDeclaration>,
    pub(crate) returns: Option<ValueKind>,
    pub(crate) attributes: Vec<Attribute>,
}

impl MethodDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub const fn returns(mut self, kind: ValueKind) -> Self {
        self.returns = Some(kind);
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

///
/// ParameterDeclaration
///

#[derive(Clone, Debug)]
pub struct ParameterDeclaration {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) attributes: Vec<Attribute>,
}

impl ParameterDeclaration {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

///
/// FieldDeclaration
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: ValueKind,
}
