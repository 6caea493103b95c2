//! Write side of a model: bulk updates and deletes.
//!
//! Paths that return instances reload the matching rows and save them one by
//! one. Those statements do not run in a transaction: a failure part-way
//! leaves the earlier rows updated.

use super::attributes::Attributes;
use super::collection::ModelCollection;
use super::finders::FindOptions;
use super::instance::Model;
use super::schema::{DELETED_FIELD, ModelSchema};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::sql_helper::{SetData, SqlHelper};
use crate::value::{Lookup, Value};
use std::sync::Arc;

/// Result of [`ModelSchema::update`] and [`ModelSchema::update_where`].
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// No matching row
    NotFound,
    /// The single instance addressed by one id
    One(Model),
    /// Every instance addressed by a list of ids or a WHERE fragment
    Many(ModelCollection),
    /// Rows affected by a single UPDATE statement
    Affected(u64),
}

impl UpdateOutcome {
    /// Number of rows touched.
    pub fn count(&self) -> u64 {
        match self {
            UpdateOutcome::NotFound => 0,
            UpdateOutcome::One(_) => 1,
            UpdateOutcome::Many(models) => models.len() as u64,
            UpdateOutcome::Affected(n) => *n,
        }
    }
}

impl ModelSchema {
    /// Update the rows addressed by one or several primary keys.
    ///
    /// With `return_instances` and no `extra` clause, the instances are loaded,
    /// updated and saved individually. Otherwise a single UPDATE addressed by
    /// `PK = id` / `PK IN(...)` plus `extra` is built; it is executed directly
    /// when `return_instances` is off.
    pub fn update(
        self: &Arc<Self>,
        conn: &dyn Connection,
        id: impl Into<Lookup>,
        attributes: &Attributes,
        extra: Option<&str>,
        return_instances: bool,
    ) -> OrmResult<UpdateOutcome> {
        let pk = self.require_pk()?.to_string();
        self.ensure_writable()?;
        let id = id.into();

        let extra = extra.filter(|e| !e.trim().is_empty());
        if return_instances && extra.is_none() {
            let Some(mut models) = self.find_by(conn, &pk, id.clone(), &FindOptions::new())? else {
                return Ok(UpdateOutcome::NotFound);
            };
            for model in models.iter_mut() {
                model.update_attributes(attributes)?;
                model.save(conn)?;
            }
            return Ok(if id.is_many() {
                UpdateOutcome::Many(models)
            } else {
                models
                    .into_first()
                    .map_or(UpdateOutcome::NotFound, UpdateOutcome::One)
            });
        }

        if id.values().is_empty() {
            return Ok(if return_instances {
                UpdateOutcome::NotFound
            } else {
                UpdateOutcome::Affected(0)
            });
        }
        let where_sql = self.where_id(conn, &pk, &id, extra);
        self.update_where(conn, attributes, &where_sql, return_instances)
    }

    /// Update every row matching a raw WHERE fragment.
    pub fn update_where(
        self: &Arc<Self>,
        conn: &dyn Connection,
        attributes: &Attributes,
        where_sql: &str,
        return_instances: bool,
    ) -> OrmResult<UpdateOutcome> {
        self.ensure_writable()?;

        if !return_instances {
            let data = SetData::Fields(
                attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            );
            let sql = SqlHelper::new(conn).build_update(&self.table, data, where_sql, true);
            self.log_sql(&sql);
            let affected = conn.execute(&sql)?;
            return Ok(UpdateOutcome::Affected(affected));
        }

        let Some(mut models) = self.find_by_sql(conn, Some(where_sql), &FindOptions::new())? else {
            return Ok(UpdateOutcome::NotFound);
        };
        for model in models.iter_mut() {
            model.update_attributes(attributes)?;
            model.save(conn)?;
        }
        Ok(UpdateOutcome::Many(models))
    }

    /// Delete the rows addressed by one or several primary keys.
    ///
    /// Soft-delete models get `DELETED = 1` instead. A blank id or an empty
    /// list deletes nothing. Returns the affected row count.
    pub fn destroy(
        self: &Arc<Self>,
        conn: &dyn Connection,
        id: impl Into<Lookup>,
        extra: Option<&str>,
    ) -> OrmResult<u64> {
        let pk = self.require_pk()?.to_string();
        self.ensure_writable()?;
        let id = id.into();
        if id.is_empty() {
            return Ok(0);
        }

        if self.soft_delete {
            let flag = Attributes::new().with(DELETED_FIELD, 1);
            return Ok(self.update(conn, id, &flag, extra, false)?.count());
        }

        let extra = extra.filter(|e| !e.trim().is_empty());
        let where_sql = self.where_id(conn, &pk, &id, extra);
        let sql = format!("DELETE FROM {} WHERE {where_sql}", self.table);
        self.log_sql(&sql);
        let affected = conn.execute(&sql)?;
        tracing::debug!(target: "foundation.model", model = %self.name, affected, "rows deleted");
        Ok(affected)
    }

    /// [`ModelSchema::destroy`] addressed by an instance of this model.
    pub fn destroy_instance(
        self: &Arc<Self>,
        conn: &dyn Connection,
        model: &Model,
        extra: Option<&str>,
    ) -> OrmResult<u64> {
        if model.schema().name != self.name {
            return Err(OrmError::WrongModel {
                expected: self.name.clone(),
                actual: model.schema().name.clone(),
            });
        }
        let id = model.id().cloned().unwrap_or(Value::Null);
        self.destroy(conn, id, extra)
    }

    fn where_id(&self, conn: &dyn Connection, pk: &str, id: &Lookup, extra: Option<&str>) -> String {
        let mut where_sql = pk.to_string();
        match id {
            Lookup::Many(values) => {
                where_sql.push_str(&SqlHelper::new(conn).build_in_statement(values));
            }
            Lookup::One(value) => {
                where_sql.push_str(" = ");
                where_sql.push_str(&conn.quote(value));
            }
        }
        if let Some(extra) = extra {
            where_sql.push(' ');
            where_sql.push_str(extra.trim());
        }
        where_sql
    }
}
