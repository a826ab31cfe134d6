use crate::{model::declaration::FieldDeclaration, value::ValueKind};

/// Largest edit distance still accepted for a fuzzy name match.
const MAX_EDIT_DISTANCE: usize = 2;

///
/// BackingFieldIdentifier
///
/// Best-effort association of a property with the field that stores it.
///

pub(crate) struct BackingFieldIdentifier;

impl BackingFieldIdentifier {
    /// Resolution order: explicit attribute, exact name, then a fuzzy match.
    /// Candidates must share the property's kind.
    pub(crate) fn identify(
        property: &str,
        kind: &ValueKind,
        explicit: Option<&str>,
        fields: &[FieldDeclaration],
    ) -> Option<String> {
        if let Some(explicit) = explicit {
            return Some(explicit.to_string());
        }

        let candidates = || fields.iter().filter(|field| field.kind == *kind);

        if let Some(field) = candidates().find(|field| field.name == property) {
            return Some(field.name.clone());
        }

        let target = normalise(property);
        candidates()
            .filter_map(|field| {
                let name = normalise(&field.name);
                let distance = strsim::levenshtein(&name, &target);
                (name.ends_with(&target) || distance <= MAX_EDIT_DISTANCE)
                    .then_some((distance, field))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, field)| field.name.clone())
    }
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
