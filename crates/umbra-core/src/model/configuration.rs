use crate::{
    error::ConfigurationError,
    model::{attribute::Attribute, declaration::ClassDeclaration},
    traits::Declare,
    types::TypeKey,
};
use indexmap::IndexMap;
use std::collections::HashMap;

///
/// ClassConfiguration
///
/// Programmatic attribute overrides for one domain type.
/// Each class, member and parameter may be configured at most once.
///

#[derive(Clone, Debug)]
pub struct ClassConfiguration {
    type_key: TypeKey,
    class: Option<Vec<Attribute>>,
    properties: IndexMap<String, Vec<Attribute>>,
    methods: IndexMap<String, Vec<Attribute>>,
    parameters: IndexMap<(String, String), Vec<Attribute>>,
}

impl ClassConfiguration {
    #[must_use]
    pub fn for_type<T: Declare>() -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            class: None,
            properties: IndexMap::new(),
            methods: IndexMap::new(),
            parameters: IndexMap::new(),
        }
    }

    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.type_key
    }

    fn class_name(&self) -> String {
        self.type_key.short_name().to_string()
    }

    pub fn configure_class(
        mut self,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigurationError> {
        if self.class.is_some() {
            return Err(ConfigurationError::DuplicateClassConfiguration {
                class: self.class_name(),
            });
        }
        self.class = Some(attributes.into_iter().collect());

        Ok(self)
    }

    pub fn configure_property(
        mut self,
        property: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigurationError> {
        let property = property.into();
        if self.properties.contains_key(&property) {
            return Err(ConfigurationError::DuplicatePropertyConfiguration {
                class: self.class_name(),
                property,
            });
        }
        self.properties
            .insert(property, attributes.into_iter().collect());

        Ok(self)
    }

    pub fn configure_method(
        mut self,
        method: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigurationError> {
        let method = method.into();
        if self.methods.contains_key(&method) {
            return Err(ConfigurationError::DuplicateMethodConfiguration {
                class: self.class_name(),
                method,
            });
        }
        self.methods
            .insert(method, attributes.into_iter().collect());

        Ok(self)
    }

    pub fn configure_parameter(
        mut self,
        method: impl Into<String>,
        parameter: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Result<Self, ConfigurationError> {
        let key = (method.into(), parameter.into());
        if self.parameters.contains_key(&key) {
            return Err(ConfigurationError::DuplicateParameterConfiguration {
                class: self.class_name(),
                method: key.0,
                parameter: key.1,
            });
        }
        self.parameters.insert(key, attributes.into_iter().collect());

        Ok(self)
    }

    pub(crate) fn class_attributes(&self) -> &[Attribute] {
        self.class.as_deref().unwrap_or_default()
    }

    pub(crate) fn property_attributes(&self, property: &str) -> &[Attribute] {
        self.properties.get(property).map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn method_attributes(&self, method: &str) -> &[Attribute] {
        self.methods.get(method).map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn parameter_attributes(&self, method: &str, parameter: &str) -> &[Attribute] {
        self.parameters
            .iter()
            .find(|((m, p), _)| m == method && p == parameter)
            .map_or(&[][..], |(_, attributes)| attributes.as_slice())
    }

    /// Reject configuration aimed at members the declaration does not have.
    pub(crate) fn validate_against(
        &self,
        declaration: &ClassDeclaration,
    ) -> Result<(), ConfigurationError> {
        let unknown = |member: &str| ConfigurationError::UnknownConfiguredMember {
            owner: declaration.name.clone(),
            member: member.to_string(),
        };
        let find_method = |name: &str| {
            declaration
                .methods
                .iter()
                .chain(&declaration.static_methods)
                .find(|m| m.name == name)
        };

        for property in self.properties.keys() {
            if !declaration.properties.iter().any(|p| &p.name == property) {
                return Err(unknown(property));
            }
        }
        for method in self.methods.keys() {
            if find_method(method).is_none() {
                return Err(unknown(method));
            }
        }
        for (method, parameter) in self.parameters.keys() {
            let known = find_method(method)
                .is_some_and(|m| m.parameters.iter().any(|p| &p.name == parameter));
            if !known {
                return Err(unknown(&format!("{method}({parameter})")));
            }
        }

        Ok(())
    }
}

///
/// ClassConfigurations
/// Registry of configurations keyed by domain type.
///

#[derive(Clone, Debug, Default)]
pub struct ClassConfigurations {
    entries: HashMap<TypeKey, ClassConfiguration>,
}

impl ClassConfigurations {
    pub fn register(
        &mut self,
        configuration: ClassConfiguration,
    ) -> Result<(), ConfigurationError> {
        let key = configuration.type_key();
        if self.entries.contains_key(&key) {
            return Err(ConfigurationError::DuplicateClassConfiguration {
                class: key.short_name().to_string(),
            });
        }
        self.entries.insert(key, configuration);

        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &TypeKey) -> Option<&ClassConfiguration> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::Customer;

    #[test]
    fn configuring_a_property_twice_fails() {
        let err = ClassConfiguration::for_type::<Customer>()
            .configure_property("name", [Attribute::MaxLength(40)])
            .and_then(|c| c.configure_property("name", [Attribute::Required(true)]))
            .expect_err("second configuration should fail");

        assert_eq!(
            err.to_string(),
            "cannot have multiple configurations for property Customer.name"
        );
    }

    #[test]
    fn configuring_a_parameter_twice_fails() {
        let err = ClassConfiguration::for_type::<Customer>()
            .configure_parameter("rename", "first", [Attribute::MaxLength(5)])
            .and_then(|c| c.configure_parameter("rename", "first", [Attribute::MaxLength(6)]))
            .expect_err("second configuration should fail");

        assert!(matches!(
            err,
            ConfigurationError::DuplicateParameterConfiguration { .. }
        ));
    }

    #[test]
    fn unknown_members_are_rejected_against_the_declaration() {
        let config = ClassConfiguration::for_type::<Customer>()
            .configure_property("nickname", [Attribute::Visible(false)])
            .expect("configuration should build");

        let err = config
            .validate_against(&<Customer as Declare>::declaration())
            .expect_err("unknown property should fail");

        assert_eq!(
            err,
            ConfigurationError::UnknownConfiguredMember {
                owner: "Customer".to_string(),
                member: "nickname".to_string(),
            }
        );
    }

    #[test]
    fn registry_rejects_second_configuration_for_a_type() {
        let mut registry = ClassConfigurations::default();
        registry
            .register(ClassConfiguration::for_type::<Customer>())
            .expect("first registration should succeed");

        let err = registry
            .register(ClassConfiguration::for_type::<Customer>())
            .expect_err("second registration should fail");

        assert_eq!(
            err,
            ConfigurationError::DuplicateClassConfiguration {
                class: "Customer".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }
}
