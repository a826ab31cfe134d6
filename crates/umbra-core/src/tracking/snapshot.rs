use crate::value::Value;
use derive_more::Deref;
use indexmap::IndexMap;

///
/// Snapshot
/// Property values of one object at a point in time, in declaration order.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct Snapshot(IndexMap<String, Value>);

impl Snapshot {
    pub fn insert(&mut self, property: impl Into<String>, value: Value) {
        self.0.insert(property.into(), value);
    }

    /// Properties whose value differs from `previous`, as `(name, old, new)`.
    /// A property missing from `previous` counts as previously null.
    #[must_use]
    pub fn diff(&self, previous: &Self) -> Vec<(String, Value, Value)> {
        self.0
            .iter()
            .filter_map(|(name, new)| {
                let old = previous.0.get(name).cloned().unwrap_or(Value::Null);
                (old != *new).then(|| (name.clone(), old, new.clone()))
            })
            .collect()
    }
}

impl FromIterator<(String, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
