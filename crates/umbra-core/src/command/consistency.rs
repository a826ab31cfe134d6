use crate::{
    error::{ConsistencyError, Error},
    model::PropertyTemplate,
    observer::{ObjectObserver, Observer},
    value::Value,
};

///
/// ConsistencyCheckCommand
///
/// Validates a save set as a whole: the domain's own rules first, then the
/// required and length attributes of every user-editable property. Every
/// failure across the set is reported at once.
///

pub struct ConsistencyCheckCommand;

impl ConsistencyCheckCommand {
    pub fn check(observers: &[Observer]) -> Result<(), Error> {
        let failures = Self::failures(observers);
        if failures.is_empty() {
            return Ok(());
        }

        Err(ConsistencyError::Failed { failures }.into())
    }

    #[must_use]
    pub fn failures(observers: &[Observer]) -> Vec<String> {
        observers
            .iter()
            .filter_map(Observer::as_object)
            .flat_map(|object| Self::object_failures(object))
            .collect()
    }

    fn object_failures(object: &ObjectObserver) -> Vec<String> {
        let Ok(instance) = object.real_object() else {
            return vec![format!(
                "{} {} is no longer alive",
                object.template().name(),
                object.id()
            )];
        };

        let mut failures = instance.check_consistency().err().unwrap_or_default();

        for property in object.template().properties() {
            if property.is_framework() {
                continue;
            }
            let Ok(value) = instance.get(property.name()) else {
                continue;
            };
            failures.extend(Self::property_failure(property, &value));
        }

        failures
    }

    fn property_failure(property: &PropertyTemplate, value: &Value) -> Option<String> {
        if value.is_null() {
            return property
                .is_required()
                .then(|| format!("{} is required", property.full_name()));
        }

        let text = value.as_text()?;
        let length = text.chars().count();
        let attributes = property.attributes();

        if let Some(max) = attributes.max_length()
            && length > max
        {
            return Some(format!(
                "{} must be at most {max} characters, found {length}",
                property.full_name()
            ));
        }
        if let Some(min) = attributes.min_length()
            && length < min
        {
            return Some(format!(
                "{} must be at least {min} characters, found {length}",
                property.full_name()
            ));
        }

        None
    }
}
