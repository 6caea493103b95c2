use super::attributes::{Attributes, normalize};
use super::schema::{DELETED_FIELD, ModelSchema};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::row::{FromRow, Row};
use crate::sql_helper::{SetData, SqlHelper};
use crate::value::Value;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;

/// One row of a model's table.
///
/// An instance starts out *phantom* (not yet inserted). The first successful
/// [`Model::save`] inserts it; later saves flush only the fields changed since
/// (the dirty set). Instances loaded from the datastore are never phantom.
///
/// ```ignore
/// let users = Arc::new(ModelSchema::builder("User", "USERS").pk("ID").build());
///
/// let mut user = users.new_instance(Attributes::new().with("name", "ana"))?;
/// user.save(&conn)?;                 // INSERT, ID assigned
/// user.set("name", "bea")?;
/// user.save(&conn)?;                 // UPDATE USERS SET NAME = 'bea' WHERE ID = 1
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    attributes: Attributes,
    dirty: Attributes,
    phantom: bool,
}

impl Model {
    /// Phantom instance from caller-supplied attributes.
    pub(crate) fn new(schema: Arc<ModelSchema>, params: Attributes) -> OrmResult<Self> {
        for field in params.keys() {
            if !schema.accepts_field(field) {
                return Err(OrmError::unknown_field(schema.name.as_str(), field));
            }
        }
        Ok(Self {
            schema,
            attributes: params,
            dirty: Attributes::new(),
            phantom: true,
        })
    }

    /// Persistent instance from a fetched row; undeclared columns are dropped.
    pub(crate) fn hydrate(schema: Arc<ModelSchema>, row: Row) -> Self {
        let mut attributes = Attributes::new();
        for (column, value) in row {
            if schema.accepts_field(&column) {
                attributes.insert(&column, value);
            } else {
                tracing::trace!(
                    target: "foundation.model",
                    model = %schema.name,
                    column = %column,
                    "dropping undeclared column"
                );
            }
        }
        Self {
            schema,
            attributes,
            dirty: Attributes::new(),
            phantom: false,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Whether the instance has not been inserted yet.
    pub fn is_phantom(&self) -> bool {
        self.phantom
    }

    /// Primary-key value, if the model has a key and the instance holds it.
    pub fn id(&self) -> Option<&Value> {
        self.schema.pk.as_deref().and_then(|pk| self.attributes.get(pk))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn has_attribute(&self, field: &str) -> bool {
        self.attributes.contains_key(field)
    }

    /// All current attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The named attributes that are present.
    pub fn get_attributes(&self, fields: &[&str]) -> Attributes {
        fields
            .iter()
            .filter_map(|f| self.attributes.get(f).map(|v| (*f, v.clone())))
            .collect()
    }

    /// Present attributes under new names: each pair is `(output_key, field)`.
    ///
    /// Output keys keep their case.
    pub fn get_attributes_as(&self, selector: &[(&str, &str)]) -> Row {
        let mut row = Row::new();
        for (key, field) in selector {
            if let Some(value) = self.attributes.get(field) {
                row.push(*key, value.clone());
            }
        }
        row
    }

    /// Every attribute except the named ones.
    pub fn get_attributes_except(&self, except: &[&str]) -> Attributes {
        let except: Vec<String> = except.iter().map(|f| normalize(f)).collect();
        self.attributes
            .iter()
            .filter(|(k, _)| !except.iter().any(|e| e.as_str() == *k))
            .map(|(k, v)| (k, v.clone()))
            .collect()
    }

    /// Fields changed since the last save of a persistent instance.
    pub fn dirty_attributes(&self) -> &Attributes {
        &self.dirty
    }

    /// Set one field. See [`Model::update_attributes`].
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> OrmResult<usize> {
        let value: Value = value.into();
        self.update_attributes([(field, value)])
    }

    /// Assign several fields and return how many actually changed.
    ///
    /// The primary key is never assigned this way, and values loosely equal
    /// to the current ones are skipped. On a persistent instance the changed
    /// fields join the dirty set. A field outside a declared field set fails
    /// the whole call before anything is assigned.
    pub fn update_attributes<K, V>(
        &mut self,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> OrmResult<usize>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let incoming: Vec<(String, Value)> = attributes
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), v.into()))
            .collect();

        if let Some((field, _)) = incoming
            .iter()
            .find(|(field, _)| !self.schema.accepts_field(field))
        {
            return Err(OrmError::unknown_field(self.schema.name.as_str(), field.as_str()));
        }

        let mut changed = 0;
        for (field, value) in incoming {
            if self.schema.is_pk(&field) {
                continue;
            }
            if self
                .attributes
                .get(&field)
                .is_some_and(|current| current.loose_eq(&value))
            {
                continue;
            }
            if !self.phantom {
                self.dirty.insert(&field, value.clone());
            }
            self.attributes.insert(&field, value);
            changed += 1;
        }
        Ok(changed)
    }

    /// Insert a phantom instance, or flush the dirty set of a persistent one.
    ///
    /// Returns `Ok(false)` when the insert affected no row or the datastore
    /// assigned no id. Driver errors propagate.
    pub fn save(&mut self, conn: &dyn Connection) -> OrmResult<bool> {
        self.schema.ensure_writable()?;

        if !self.phantom {
            self.exec_update(conn)?;
            return Ok(true);
        }

        if let Some(pk) = self.schema.pk.clone() {
            if self.schema.autoset_pk {
                self.attributes.remove(&pk);
            } else if self.attributes.get(&pk).is_none_or(Value::is_null) {
                return Err(OrmError::MissingPrimaryKeyValue {
                    model: self.schema.name.clone(),
                    pk,
                });
            }
        }

        let Some(id) = self.exec_insert(conn)? else {
            return Ok(false);
        };
        if let Some(pk) = self.schema.pk.clone() {
            self.attributes.insert(&pk, id);
        }
        self.phantom = false;
        self.dirty.clear();
        Ok(true)
    }

    /// Delete this instance's row (or flag it on soft-delete models).
    ///
    /// On success a hard-deleted instance becomes phantom again, and a
    /// soft-deleted one has its `DELETED` attribute set.
    pub fn self_destroy(&mut self, conn: &dyn Connection) -> OrmResult<bool> {
        let schema = Arc::clone(&self.schema);
        let deleted = schema.destroy_instance(conn, self, None)? > 0;
        if deleted {
            if schema.soft_delete {
                self.attributes.insert(DELETED_FIELD, 1);
            } else {
                self.phantom = true;
                self.dirty.clear();
            }
        }
        Ok(deleted)
    }

    /// Decode the attributes into a typed struct.
    pub fn decode<T: FromRow>(&self) -> OrmResult<T> {
        T::from_row(&self.attributes.to_row())
    }

    /// INSERT the attributes; the new id, or `None` when nothing was stored.
    fn exec_insert(&self, conn: &dyn Connection) -> OrmResult<Option<Value>> {
        let table = &self.schema.table;
        let sql = if self.attributes.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let helper = SqlHelper::new(conn);
            let columns: Vec<&str> = self.attributes.keys().collect();
            let values: Vec<String> = self
                .attributes
                .iter()
                .map(|(_, v)| helper.render_value(v, true))
                .collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                values.join(", ")
            )
        };
        self.schema.log_sql(&sql);

        if conn.execute(&sql)? == 0 {
            return Ok(None);
        }

        // A caller-assigned key is kept as given, even `0` or `""`.
        let id = match self.schema.pk.as_deref() {
            None => Value::Bool(true),
            Some(_) if self.schema.autoset_pk => {
                let id = conn.last_insert_id()?;
                if id.is_blank() {
                    return Ok(None);
                }
                id
            }
            Some(pk) => self.attributes.get(pk).cloned().unwrap_or_default(),
        };
        tracing::debug!(target: "foundation.model", model = %self.schema.name, id = %id, "row inserted");
        Ok(Some(id))
    }

    /// UPDATE the dirty fields; a clean instance runs no statement.
    fn exec_update(&mut self, conn: &dyn Connection) -> OrmResult<u64> {
        if self.dirty.is_empty() {
            return Ok(0);
        }
        let pk = self.schema.require_pk()?;
        let id = self.id().cloned().unwrap_or_default();
        let where_sql = format!("{pk} = {}", conn.quote(&id));

        let data = SetData::Fields(
            self.dirty
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        let sql = SqlHelper::new(conn).build_update(&self.schema.table, data, &where_sql, true);
        self.schema.log_sql(&sql);

        let affected = conn.execute(&sql)?;
        self.dirty.clear();
        Ok(affected)
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
