//! Read side of a model: query construction, finders and counts.

use super::attributes::Attributes;
use super::collection::ModelCollection;
use super::instance::Model;
use super::schema::{DELETED_FIELD, ModelSchema};
use crate::client::Connection;
use crate::error::OrmResult;
use crate::query::Query;
use crate::sql_helper::SqlHelper;
use crate::value::{Lookup, Value};
use std::fmt::Display;
use std::sync::Arc;

/// ORDER BY / LIMIT / column selection for the SQL finders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Raw ORDER BY text
    pub order_by: Option<String>,
    /// Raw LIMIT text (`"10"` or `"20, 10"`)
    pub limit: Option<String>,
    /// Selected columns; empty selects `*`
    pub fields: Vec<String>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: impl Display) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

impl ModelSchema {
    /// Table name, followed by `alias` when one is given.
    pub fn table_name(&self, alias: &str) -> String {
        if alias.is_empty() {
            self.table.clone()
        } else {
            format!("{} {alias}", self.table)
        }
    }

    /// A [`Query`] selecting from this model's table, bound to this model.
    ///
    /// With an alias, the table is aliased and each field is qualified with it.
    pub fn basic_query(self: &Arc<Self>, fields: &[&str], alias: &str) -> Query {
        let mut query = Query::new();
        if alias.is_empty() {
            query.add_from(self.table.as_str());
        } else {
            query.add_from(format!("{} as {alias}", self.table));
        }
        query.set_model(self.name.as_str());
        for field in fields {
            if alias.is_empty() {
                query.add_field(*field);
            } else {
                query.add_field(format!("{alias}.{field}"));
            }
        }
        query
    }

    /// A phantom instance holding `params`.
    ///
    /// Fails with [`OrmError::UnknownField`](crate::OrmError::UnknownField) when
    /// a field is outside a declared field set.
    pub fn new_instance(self: &Arc<Self>, params: Attributes) -> OrmResult<Model> {
        Model::new(Arc::clone(self), params)
    }

    /// A phantom instance, saved right away when `auto_save` is set.
    ///
    /// Returns `None` when the save did not go through.
    pub fn create(
        self: &Arc<Self>,
        conn: &dyn Connection,
        params: Attributes,
        auto_save: bool,
    ) -> OrmResult<Option<Model>> {
        let mut model = self.new_instance(params)?;
        if auto_save && !model.save(conn)? {
            return Ok(None);
        }
        Ok(Some(model))
    }

    /// Every row (every non-deleted row for soft-delete models).
    pub fn all(
        self: &Arc<Self>,
        conn: &dyn Connection,
        options: &FindOptions,
    ) -> OrmResult<Option<ModelCollection>> {
        let where_sql = self.soft_delete.then(|| format!("{DELETED_FIELD} = 0"));
        self.find_by_sql(conn, where_sql.as_deref(), options)
    }

    /// Instance with primary key `id`.
    pub fn find(
        self: &Arc<Self>,
        conn: &dyn Connection,
        id: impl Into<Value>,
        fields: &[&str],
    ) -> OrmResult<Option<Model>> {
        Ok(self
            .find_many(conn, Lookup::One(id.into()), fields)?
            .and_then(ModelCollection::into_first))
    }

    /// Instances matching one or several primary keys.
    pub fn find_many(
        self: &Arc<Self>,
        conn: &dyn Connection,
        ids: impl Into<Lookup>,
        fields: &[&str],
    ) -> OrmResult<Option<ModelCollection>> {
        let pk = self.require_pk()?.to_string();
        let options = FindOptions::new().fields(fields.iter().copied());
        self.find_by(conn, &pk, ids, &options)
    }

    /// Instances whose `key` equals the value, or is in the list of values.
    ///
    /// Soft-delete models only return rows not flagged deleted. An empty list
    /// matches nothing and runs no query.
    pub fn find_by(
        self: &Arc<Self>,
        conn: &dyn Connection,
        key: &str,
        value: impl Into<Lookup>,
        options: &FindOptions,
    ) -> OrmResult<Option<ModelCollection>> {
        let value = value.into();
        let mut where_sql = key.to_string();
        match &value {
            Lookup::Many(values) if values.is_empty() => return Ok(None),
            Lookup::Many(values) => {
                where_sql.push_str(&SqlHelper::new(conn).build_in_statement(values));
            }
            Lookup::One(v) => {
                where_sql.push_str(" = ");
                where_sql.push_str(&conn.quote(v));
            }
        }
        if self.soft_delete {
            where_sql.push_str(&format!(" AND {DELETED_FIELD} = 0"));
        }
        self.find_by_sql(conn, Some(&where_sql), options)
    }

    /// Instances selected by a raw WHERE fragment.
    ///
    /// When columns are restricted, the primary key is always selected too.
    pub fn find_by_sql(
        self: &Arc<Self>,
        conn: &dyn Connection,
        where_sql: Option<&str>,
        options: &FindOptions,
    ) -> OrmResult<Option<ModelCollection>> {
        let fields = if options.fields.is_empty() {
            "*".to_string()
        } else {
            let mut fields = options.fields.clone();
            if let Some(pk) = &self.pk {
                if !fields.iter().any(|f| f.eq_ignore_ascii_case(pk)) {
                    fields.insert(0, pk.clone());
                }
            }
            fields.join(", ")
        };

        let mut sql = format!("SELECT {fields} FROM {}", self.table);
        if let Some(w) = where_sql.filter(|w| !w.trim().is_empty()) {
            sql.push_str(&format!(" WHERE {w}"));
        }
        if let Some(order_by) = options.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push_str(&format!(" ORDER BY {order_by}"));
        }
        if let Some(limit) = &options.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        self.construct_from_sql(conn, &sql)
    }

    /// Instances selected by a compiled [`Query`].
    pub fn find_by_query(
        self: &Arc<Self>,
        conn: &dyn Connection,
        query: &Query,
    ) -> OrmResult<Option<ModelCollection>> {
        self.construct_from_sql(conn, &query.to_sql())
    }

    /// Number of rows matching a raw WHERE fragment.
    pub fn find_count(
        &self,
        conn: &dyn Connection,
        where_sql: &str,
        limit: Option<u64>,
    ) -> OrmResult<u64> {
        let mut sql = format!("SELECT 1 FROM {} WHERE {where_sql}", self.table);
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        self.log_sql(&sql);
        Ok(conn.query(&sql)?.row_count() as u64)
    }

    /// Number of rows a [`Query`] would return.
    pub fn find_count_by_query(&self, conn: &dyn Connection, query: &Query) -> OrmResult<u64> {
        let mut query = query.clone();
        query.set_fields(["1"]);
        let sql = query.to_sql();
        self.log_sql(&sql);
        Ok(conn.query(&sql)?.row_count() as u64)
    }

    /// Whether a row with primary key `id` exists.
    pub fn exists(&self, conn: &dyn Connection, id: impl Into<Value>) -> OrmResult<bool> {
        let pk = self.require_pk()?;
        let where_sql = format!("{pk} = {}", conn.quote(&id.into()));
        Ok(self.find_count(conn, &where_sql, None)? > 0)
    }

    fn construct_from_sql(
        self: &Arc<Self>,
        conn: &dyn Connection,
        sql: &str,
    ) -> OrmResult<Option<ModelCollection>> {
        self.log_sql(sql);
        let rows = conn.query(sql)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let models = rows
            .fetch_all()
            .into_iter()
            .map(|row| Model::hydrate(Arc::clone(self), row))
            .collect();
        Ok(Some(models))
    }
}
