//! Bulk configuration of a [`Query`] from a JSON object.
//!
//! Recognized keys: `fields`, `from`, `joins`, `where`, `limit`, `distinct`,
//! `model`, `groupBy`, `orderBy`. Anything else is ignored.
//!
//! ```ignore
//! let q = Query::from_properties(&json!({
//!     "fields": "A, B",
//!     "from": "T",
//!     "joins": ["LEFT", "U", "U.T_ID = T.ID"],
//!     "where": ["A = 1", [["B = 2", "C = 3"], "OR"]],
//!     "orderBy": [["A", "DESC"]],
//!     "limit": [10, 5],
//! }))?;
//! ```

use super::{Query, SortDirection};
use crate::condition::{BoolOp, QueryCondition};
use crate::error::{OrmError, OrmResult};
use serde_json::Value as Json;

impl Query {
    /// Build a query from a properties object.
    pub fn from_properties(properties: &Json) -> OrmResult<Self> {
        let mut query = Query::new();
        query.set(properties, false)?;
        Ok(query)
    }

    /// Configure from a properties object.
    ///
    /// Unless `append` is set, every recognized key present in `properties`
    /// first clears the matching part of the query. A `null` value only
    /// clears it.
    pub fn set(&mut self, properties: &Json, append: bool) -> OrmResult<&mut Self> {
        let map = match properties {
            Json::Null => return Ok(self),
            Json::Object(map) => map,
            other => {
                return Err(OrmError::invalid_argument(format!(
                    "query properties must be an object, got {other}"
                )));
            }
        };

        for (key, values) in map {
            if !append {
                self.reset(key);
            }
            if values.is_null() {
                continue;
            }
            match key.as_str() {
                "fields" => self.set_fields_property(values)?,
                "from" => {
                    for from in string_list(key, values)? {
                        self.add_from(from);
                    }
                }
                "groupBy" => {
                    for field in string_list(key, values)? {
                        self.add_group_by(field);
                    }
                }
                "joins" => self.set_joins_property(values, append)?,
                "where" => self.set_where_property(values)?,
                "limit" => self.set_limit_property(values)?,
                "distinct" => {
                    self.distinct = truthy(values);
                }
                "model" => {
                    let model = scalar_string(key, values)?;
                    self.set_model(model);
                }
                "orderBy" => self.set_order_by_property(values)?,
                _ => {}
            }
        }
        Ok(self)
    }

    /// [`Query::set`] in append mode.
    pub fn add(&mut self, properties: &Json) -> OrmResult<&mut Self> {
        self.set(properties, true)
    }

    fn reset(&mut self, key: &str) {
        match key {
            "fields" => self.fields.clear(),
            "from" => self.from.clear(),
            "joins" => self.joins.clear(),
            "where" => self.wheres.clear(),
            "groupBy" => self.group_by.clear(),
            "orderBy" => self.order_by.clear(),
            "limit" => self.limit = None,
            "distinct" => self.distinct = false,
            "model" => self.model = None,
            _ => {}
        }
    }

    fn set_fields_property(&mut self, values: &Json) -> OrmResult<()> {
        match values {
            Json::String(s) => {
                for field in s.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                    self.add_field(field);
                }
            }
            other => {
                for field in string_list("fields", other)? {
                    self.add_field(field);
                }
            }
        }
        Ok(())
    }

    fn set_joins_property(&mut self, values: &Json, append: bool) -> OrmResult<()> {
        let items = match values {
            Json::Array(items) if items.is_empty() => return Ok(()),
            Json::Array(items) if items[0].is_string() => std::slice::from_ref(values),
            Json::Array(items) => items.as_slice(),
            other => {
                return Err(OrmError::invalid_argument(format!(
                    "joins must be a join tuple or a list of tuples, got {other}"
                )));
            }
        };

        for join in items {
            let tuple = match join {
                Json::Null => continue,
                Json::Array(tuple) if tuple.is_empty() => continue,
                Json::Array(tuple) => tuple,
                other => {
                    return Err(OrmError::invalid_argument(format!(
                        "join must be a (type, table, on) tuple, got {other}"
                    )));
                }
            };
            if tuple.len() < 3 {
                return Err(OrmError::invalid_argument(
                    "Not enough parameters for a join: expected (type, table, on)",
                ));
            }
            let kind = scalar_string("join type", &tuple[0])?;
            let table = scalar_string("join table", &tuple[1])?;
            let on = conditions_from_json(&tuple[2])?;
            if append {
                let override_existing = tuple.get(3).map(truthy).unwrap_or(false);
                self.add_join(&kind, &table, on, override_existing);
            } else {
                self.set_join(&kind, &table, on);
            }
        }
        Ok(())
    }

    fn set_where_property(&mut self, values: &Json) -> OrmResult<()> {
        for cond in conditions_from_json(values)? {
            self.add_where(cond);
        }
        Ok(())
    }

    fn set_limit_property(&mut self, values: &Json) -> OrmResult<()> {
        match values {
            Json::String(raw) => {
                self.set_raw_limit(raw.as_str());
            }
            Json::Number(_) => {
                self.set_limit(unsigned("limit", values)?, None);
            }
            Json::Array(items) => {
                let limit = match items.first() {
                    Some(v) => unsigned("limit", v)?,
                    None => return Err(OrmError::invalid_argument("limit requires a value")),
                };
                let offset = match items.get(1) {
                    None | Some(Json::Null) => None,
                    Some(v) => Some(unsigned("offset", v)?),
                };
                self.set_limit(limit, offset);
            }
            other => {
                return Err(OrmError::invalid_argument(format!(
                    "Invalid limit: {other}"
                )));
            }
        }
        Ok(())
    }

    fn set_order_by_property(&mut self, values: &Json) -> OrmResult<()> {
        let items = match values {
            Json::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for item in items {
            match item {
                Json::Null => {}
                Json::Array(tuple) => {
                    let field = match tuple.first() {
                        Some(f) => scalar_string("orderBy field", f)?,
                        None => continue,
                    };
                    let direction = match tuple.get(1) {
                        None | Some(Json::Null) => None,
                        Some(Json::String(dir)) => Some(dir.parse::<SortDirection>()?),
                        Some(other) => {
                            return Err(OrmError::invalid_argument(format!(
                                "Invalid sort direction: {other}"
                            )));
                        }
                    };
                    self.add_order_by(field, direction);
                }
                other => {
                    let field = scalar_string("orderBy field", other)?;
                    self.add_order_by(field, None);
                }
            }
        }
        Ok(())
    }
}

/// Conditions from a string, or a list of strings and
/// `[assertion, operator?, wrap?]` tuples.
fn conditions_from_json(values: &Json) -> OrmResult<Vec<QueryCondition>> {
    match values {
        Json::Null => Ok(Vec::new()),
        Json::String(sql) => Ok(vec![QueryCondition::new(sql.as_str())]),
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Json::Null => {}
                    Json::String(sql) => out.push(QueryCondition::new(sql.as_str())),
                    Json::Array(args) => {
                        out.push(QueryCondition::from_json_args(args, BoolOp::And, false)?)
                    }
                    other => {
                        return Err(OrmError::invalid_argument(format!(
                            "Invalid condition: {other}"
                        )));
                    }
                }
            }
            Ok(out)
        }
        other => Err(OrmError::invalid_argument(format!(
            "Invalid condition: {other}"
        ))),
    }
}

fn string_list(key: &str, values: &Json) -> OrmResult<Vec<String>> {
    match values {
        Json::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| scalar_string(key, v))
            .collect(),
        other => Ok(vec![scalar_string(key, other)?]),
    }
}

fn scalar_string(key: &str, value: &Json) -> OrmResult<String> {
    match value {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        other => Err(OrmError::invalid_argument(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

fn unsigned(key: &str, value: &Json) -> OrmResult<u64> {
    let parsed = match value {
        Json::Number(n) => n.as_u64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        OrmError::invalid_argument(format!("{key} must be a non-negative integer, got {value}"))
    })
}

fn truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Json::String(s) => !(s.is_empty() || s == "0"),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}
