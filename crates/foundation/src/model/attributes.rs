use crate::row::Row;
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered field map with upper-case keys.
///
/// Every key is upper-cased on the way in, so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

pub(crate) fn normalize(field: &str) -> String {
    field.trim().to_ascii_uppercase()
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Attributes::insert`].
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        let key = normalize(field);
        let value = value.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.position(&normalize(field)).map(|idx| &self.entries[idx].1)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.position(&normalize(field))
            .map(|idx| self.entries.remove(idx).1)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.position(&normalize(field)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy into a [`Row`], e.g. for [`FromRow`](crate::FromRow) decoding.
    pub fn to_row(&self) -> Row {
        self.entries.iter().cloned().collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k.as_ref(), v);
        }
        attrs
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
