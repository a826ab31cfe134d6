use crate::{
    config::IntrospectionConfig,
    error::ConfigurationError,
    model::{
        attribute::{Attribute, AttributeKind},
        member::PropertyTemplate,
    },
    value::{ScalarKind, ValueKind},
};
use indexmap::IndexMap;

///
/// TrackingProperties
/// Names of the id, version and audit properties of a class, when present.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct TrackingProperties {
    pub(crate) id: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) audit: Option<String>,
}

///
/// TrackingPropertiesIdentifier
///
/// Finds engine-managed properties: an explicit attribute first, then a
/// property of the right kind whose name starts or ends with the token.
///

pub(crate) struct TrackingPropertiesIdentifier<'a> {
    config: &'a IntrospectionConfig,
}

impl<'a> TrackingPropertiesIdentifier<'a> {
    pub(crate) const fn new(config: &'a IntrospectionConfig) -> Self {
        Self { config }
    }

    pub(crate) fn identify(
        &self,
        owner: &str,
        properties: &IndexMap<String, PropertyTemplate>,
    ) -> Result<TrackingProperties, ConfigurationError> {
        let id = Self::resolve(
            owner,
            "id",
            properties,
            AttributeKind::Key,
            &self.config.id_token,
            |kind| *kind == ValueKind::ULID,
        )?;
        let version = Self::resolve(
            owner,
            "version",
            properties,
            AttributeKind::ConcurrencyCheck,
            &self.config.version_token,
            |kind| matches!(kind, ValueKind::Scalar(ScalarKind::Int | ScalarKind::Uint)),
        )?;
        let audit = Self::explicit(owner, "audit", properties, AttributeKind::Audit)?;

        Ok(TrackingProperties { id, version, audit })
    }

    fn resolve(
        owner: &str,
        role: &str,
        properties: &IndexMap<String, PropertyTemplate>,
        marker: AttributeKind,
        token: &str,
        kind_fits: impl Fn(&ValueKind) -> bool,
    ) -> Result<Option<String>, ConfigurationError> {
        if let Some(name) = Self::explicit(owner, role, properties, marker)? {
            return Ok(Some(name));
        }

        let token = token.to_lowercase();
        let found = properties.values().find(|property| {
            let name = property.name().to_lowercase();
            kind_fits(property.kind()) && (name.starts_with(&token) || name.ends_with(&token))
        });

        Ok(found.map(|property| property.name().to_string()))
    }

    fn explicit(
        owner: &str,
        role: &str,
        properties: &IndexMap<String, PropertyTemplate>,
        marker: AttributeKind,
    ) -> Result<Option<String>, ConfigurationError> {
        let mut marked = properties
            .values()
            .filter(|property| property.attributes().has(marker));

        let first = marked.next();
        if marked.next().is_some() {
            return Err(ConfigurationError::AmbiguousTrackingProperty {
                owner: owner.to_string(),
                role: role.to_string(),
            });
        }

        Ok(first.map(|property| property.name().to_string()))
    }

    /// Id and version are never edited by users and stay out of projections.
    pub(crate) fn prevent_modifications(
        properties: &mut IndexMap<String, PropertyTemplate>,
        tracking: &TrackingProperties,
    ) {
        for name in [&tracking.id, &tracking.version].into_iter().flatten() {
            if let Some(property) = properties.get_mut(name) {
                property.attributes.force(Attribute::read_only());
                property.attributes.force(Attribute::Visible(false));
                property.is_framework = true;
            }
        }
        if let Some(property) = tracking.audit.as_ref().and_then(|n| properties.get_mut(n)) {
            property.is_framework = true;
        }
    }
}
