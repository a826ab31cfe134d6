use crate::{
    config::IntrospectionConfig,
    error::{ArgumentError, ConfigurationError, Error, ErrorOrigin},
    model::{
        attribute::{AttributeMap, AttributeTarget, MissingAttributeBuilder},
        configuration::ClassConfiguration,
        declaration::{ClassDeclaration, FieldDeclaration, MethodDeclaration},
        member::{MethodTemplate, ParameterTemplate, PropertyTemplate},
        tracking::{TrackingProperties, TrackingPropertiesIdentifier},
    },
    types::{ObjectRef, TypeKey},
    value::{ScalarKind, ValueKind},
};
use indexmap::IndexMap;
use std::{collections::HashSet, sync::Arc, sync::OnceLock};

///
/// ClassTemplate
///
/// One-time description of a domain type. Exactly one exists per type for
/// the lifetime of its template cache, and it never changes once built.
///

#[derive(Debug)]
pub struct ClassTemplate {
    type_key: TypeKey,
    name: String,
    full_name: String,
    is_persistable: bool,
    is_creatable: bool,
    is_entity: bool,
    is_value_object: bool,
    is_aggregate_root: bool,
    is_abstract: bool,
    attributes: AttributeMap,
    tracking: TrackingProperties,
    properties: IndexMap<String, Arc<PropertyTemplate>>,
    methods: IndexMap<String, Arc<MethodTemplate>>,
    static_methods: IndexMap<String, Arc<MethodTemplate>>,
    constructor: Option<fn() -> ObjectRef>,
    finalised: OnceLock<()>,
}

impl ClassTemplate {
    pub(crate) fn build(
        type_key: TypeKey,
        declaration: &ClassDeclaration,
        configuration: Option<&ClassConfiguration>,
        config: &IntrospectionConfig,
    ) -> Result<Self, ConfigurationError> {
        let owner = declaration.name.as_str();
        let defaults = MissingAttributeBuilder::new(config);

        Self::check_unique_members(declaration)?;
        if let Some(configuration) = configuration {
            configuration.validate_against(declaration)?;
        }

        let attributes = AttributeMap::build(
            owner,
            AttributeTarget::Class {
                is_entity: declaration.is_entity,
            },
            &declaration.attributes,
            configuration.map_or(&[][..], ClassConfiguration::class_attributes),
            &defaults,
        )?;

        let fields: Arc<[FieldDeclaration]> = declaration.fields.clone().into();
        let mut properties = IndexMap::new();
        for property in &declaration.properties {
            let attributes = AttributeMap::build(
                &format!("{owner}.{}", property.name),
                AttributeTarget::Property(property.kind),
                &property.attributes,
                configuration.map_or(&[][..], |c| c.property_attributes(&property.name)),
                &defaults,
            )?;
            properties.insert(
                property.name.clone(),
                PropertyTemplate::new(
                    owner,
                    &property.name,
                    property.kind,
                    attributes,
                    Arc::clone(&fields),
                ),
            );
        }

        let tracking = TrackingPropertiesIdentifier::new(config).identify(owner, &properties)?;
        TrackingPropertiesIdentifier::prevent_modifications(&mut properties, &tracking);

        let methods =
            Self::build_methods(owner, &declaration.methods, false, configuration, &defaults)?;
        let static_methods = Self::build_methods(
            owner,
            &declaration.static_methods,
            true,
            configuration,
            &defaults,
        )?;

        let is_persistable = attributes.is_persistable() && tracking.id.is_some();
        let is_creatable = attributes.is_creatable()
            && !declaration.is_abstract
            && declaration.constructor.is_some();

        Ok(Self {
            type_key,
            name: declaration.name.clone(),
            full_name: type_key.path().to_string(),
            is_persistable,
            is_creatable,
            is_entity: declaration.is_entity,
            is_value_object: declaration.is_value_object,
            is_aggregate_root: declaration.is_aggregate_root,
            is_abstract: declaration.is_abstract,
            attributes,
            tracking,
            properties: properties
                .into_iter()
                .map(|(name, template)| (name, Arc::new(template)))
                .collect(),
            methods,
            static_methods,
            constructor: declaration.constructor,
            finalised: OnceLock::new(),
        })
    }

    fn check_unique_members(declaration: &ClassDeclaration) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        let names = declaration
            .properties
            .iter()
            .map(|p| &p.name)
            .chain(declaration.methods.iter().map(|m| &m.name))
            .chain(declaration.static_methods.iter().map(|m| &m.name));

        for name in names {
            if !seen.insert(name) {
                return Err(ConfigurationError::DuplicateMember {
                    owner: declaration.name.clone(),
                    member: name.clone(),
                });
            }
        }

        Ok(())
    }

    fn build_methods(
        owner: &str,
        declarations: &[MethodDeclaration],
        is_static: bool,
        configuration: Option<&ClassConfiguration>,
        defaults: &MissingAttributeBuilder<'_>,
    ) -> Result<IndexMap<String, Arc<MethodTemplate>>, ConfigurationError> {
        let mut methods = IndexMap::new();

        for method in declarations {
            let label = format!("{owner}.{}", method.name);
            let attributes = AttributeMap::build(
                &label,
                AttributeTarget::Method,
                &method.attributes,
                configuration.map_or(&[][..], |c| c.method_attributes(&method.name)),
                defaults,
            )?;

            let mut parameters = IndexMap::new();
            for (position, parameter) in method.parameters.iter().enumerate() {
                let attributes = AttributeMap::build(
                    &format!("{label}({})", parameter.name),
                    AttributeTarget::Parameter(parameter.kind),
                    &parameter.attributes,
                    configuration.map_or(&[][..], |c| {
                        c.parameter_attributes(&method.name, &parameter.name)
                    }),
                    defaults,
                )?;
                let template =
                    ParameterTemplate::new(&parameter.name, parameter.kind, position, attributes);
                if parameters
                    .insert(parameter.name.clone(), Arc::new(template))
                    .is_some()
                {
                    return Err(ConfigurationError::DuplicateMember {
                        owner: label,
                        member: parameter.name.clone(),
                    });
                }
            }

            methods.insert(
                method.name.clone(),
                Arc::new(MethodTemplate::new(
                    owner,
                    &method.name,
                    is_static,
                    method.returns,
                    parameters,
                    attributes,
                )),
            );
        }

        Ok(methods)
    }

    /// Force every lazily derived part so later readers never compute.
    pub fn finalise(&self) {
        self.finalised.get_or_init(|| {
            for property in self.properties.values() {
                let _ = property.backing_field_name();
            }
        });
    }

    #[must_use]
    pub fn is_finalised(&self) -> bool {
        self.finalised.get().is_some()
    }

    /// Create a fresh instance through the declared constructor.
    pub fn create_instance(&self) -> Result<ObjectRef, Error> {
        match self.constructor {
            Some(constructor) if self.is_creatable => Ok(constructor()),
            _ => Err(ArgumentError::NotCreatable {
                type_name: self.name.clone(),
            }
            .into_error(ErrorOrigin::Template)),
        }
    }

    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.is_persistable
    }

    #[must_use]
    pub const fn is_creatable(&self) -> bool {
        self.is_creatable
    }

    #[must_use]
    pub const fn is_entity(&self) -> bool {
        self.is_entity
    }

    #[must_use]
    pub const fn is_value_object(&self) -> bool {
        self.is_value_object
    }

    #[must_use]
    pub const fn is_aggregate_root(&self) -> bool {
        self.is_aggregate_root
    }

    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    #[must_use]
    pub fn id_property(&self) -> Option<&Arc<PropertyTemplate>> {
        self.tracking.id.as_ref().and_then(|name| self.properties.get(name))
    }

    #[must_use]
    pub fn version_property(&self) -> Option<&Arc<PropertyTemplate>> {
        self.tracking
            .version
            .as_ref()
            .and_then(|name| self.properties.get(name))
    }

    #[must_use]
    pub fn audit_property(&self) -> Option<&Arc<PropertyTemplate>> {
        self.tracking
            .audit
            .as_ref()
            .and_then(|name| self.properties.get(name))
    }

    pub fn properties(&self) -> impl Iterator<Item = &Arc<PropertyTemplate>> {
        self.properties.values()
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyTemplate>> {
        self.properties.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodTemplate>> {
        self.methods.values()
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Arc<MethodTemplate>> {
        self.methods.get(name)
    }

    pub fn static_methods(&self) -> impl Iterator<Item = &Arc<MethodTemplate>> {
        self.static_methods.values()
    }
}

///
/// CollectionTemplate
///

#[derive(Debug)]
pub struct CollectionTemplate {
    name: String,
    element: Arc<ClassTemplate>,
}

impl CollectionTemplate {
    pub(crate) fn new(element: Arc<ClassTemplate>) -> Self {
        Self {
            name: format!("Collection<{}>", element.name()),
            element,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn element(&self) -> &Arc<ClassTemplate> {
        &self.element
    }

    #[must_use]
    pub fn element_kind(&self) -> ValueKind {
        ValueKind::Object(self.element.type_key())
    }
}

///
/// ValueTemplate
///

#[derive(Debug)]
pub struct ValueTemplate {
    kind: ScalarKind,
}

impl ValueTemplate {
    pub(crate) const fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.kind.to_string()
    }
}
