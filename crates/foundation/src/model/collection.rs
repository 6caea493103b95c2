use super::attributes::Attributes;
use super::instance::Model;
use crate::error::OrmResult;
use crate::row::{FromRow, Row};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::collections::BTreeMap;

/// Ordered list of model instances, optionally keyed by a field value.
#[derive(Debug, Clone, Default)]
pub struct ModelCollection {
    items: Vec<Model>,
    /// Keys aligned with `items`, set by `index_by`
    keys: Option<Vec<String>>,
}

impl ModelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance.
    ///
    /// On an indexed collection the instance is keyed one past the largest
    /// integer key, or `0` when no key is an integer.
    pub fn push(&mut self, model: Model) {
        if let Some(keys) = &mut self.keys {
            let next = keys
                .iter()
                .filter_map(|k| k.parse::<i64>().ok())
                .max()
                .map_or(0, |max| max.saturating_add(1));
            keys.push(next.to_string());
        }
        self.items.push(model);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&Model> {
        self.items.first()
    }

    /// Take the first instance.
    pub fn into_first(self) -> Option<Model> {
        self.items.into_iter().next()
    }

    /// Instance at `position`.
    pub fn get(&self, position: usize) -> Option<&Model> {
        self.items.get(position)
    }

    /// Instance stored under `key` by [`ModelCollection::index_by`].
    ///
    /// Without an index, `key` is read as a position.
    pub fn get_by_key(&self, key: &str) -> Option<&Model> {
        match &self.keys {
            Some(keys) => keys
                .iter()
                .position(|k| k == key)
                .and_then(|idx| self.items.get(idx)),
            None => key.parse().ok().and_then(|idx: usize| self.items.get(idx)),
        }
    }

    /// Re-key the instances by the text of `field`.
    ///
    /// When several instances share a key, the last one wins and takes the
    /// position of the first.
    pub fn index_by(self, field: &str) -> Self {
        let mut keys: Vec<String> = Vec::with_capacity(self.items.len());
        let mut items: Vec<Model> = Vec::with_capacity(self.items.len());
        for model in self.items {
            let key = model.get(field).map(ToString::to_string).unwrap_or_default();
            match keys.iter().position(|k| *k == key) {
                Some(idx) => items[idx] = model,
                None => {
                    keys.push(key);
                    items.push(model);
                }
            }
        }
        Self {
            items,
            keys: Some(keys),
        }
    }

    /// Index keys, if [`ModelCollection::index_by`] was applied.
    pub fn keys(&self) -> Option<&[String]> {
        self.keys.as_deref()
    }

    /// Partition the instances by the text of `field`.
    pub fn grouped_by(&self, field: &str) -> BTreeMap<String, ModelCollection> {
        let mut groups: BTreeMap<String, ModelCollection> = BTreeMap::new();
        for model in &self.items {
            let key = model.get(field).map(ToString::to_string).unwrap_or_default();
            groups.entry(key).or_default().push(model.clone());
        }
        groups
    }

    /// Instances for which `predicate` holds.
    pub fn filter(&self, mut predicate: impl FnMut(&Model) -> bool) -> ModelCollection {
        self.items.iter().filter(|m| predicate(*m)).cloned().collect()
    }

    /// The selected attributes of every instance; all attributes when `fields` is empty.
    pub fn as_attribute_collection(&self, fields: &[&str]) -> Vec<Attributes> {
        self.items
            .iter()
            .map(|m| {
                if fields.is_empty() {
                    m.attributes().clone()
                } else {
                    m.get_attributes(fields)
                }
            })
            .collect()
    }

    /// The selected attributes of every instance under new names.
    ///
    /// Each pair is `(output_key, field)`, as in [`Model::get_attributes_as`].
    pub fn as_attribute_collection_as(&self, selector: &[(&str, &str)]) -> Vec<Row> {
        self.items
            .iter()
            .map(|m| m.get_attributes_as(selector))
            .collect()
    }

    /// Decode every instance into a typed struct.
    pub fn decode_all<T: FromRow>(&self) -> OrmResult<Vec<T>> {
        self.items.iter().map(Model::decode).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Model> {
        self.items.iter_mut()
    }
}

impl FromIterator<Model> for ModelCollection {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            keys: None,
        }
    }
}

impl IntoIterator for ModelCollection {
    type Item = Model;
    type IntoIter = std::vec::IntoIter<Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ModelCollection {
    type Item = &'a Model;
    type IntoIter = std::slice::Iter<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a mut ModelCollection {
    type Item = &'a mut Model;
    type IntoIter = std::slice::IterMut<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl Serialize for ModelCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for model in &self.items {
            seq.serialize_element(model)?;
        }
        seq.end()
    }
}
