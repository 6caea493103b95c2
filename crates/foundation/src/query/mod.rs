//! SELECT query builder.
//!
//! [`Query`] accumulates the parts of a SELECT statement and compiles them to
//! SQL text, one clause per line:
//!
//! ```ignore
//! use foundation::{Query, SortDirection};
//!
//! let mut q = Query::new();
//! q.set_fields(["A", "B"])
//!     .add_from("T")
//!     .add_where("A = 1")
//!     .add_order_by("A", Some(SortDirection::Desc))
//!     .set_limit(10, Some(5));
//! assert_eq!(q.to_sql(), "SELECT A, B\nFROM T\nWHERE A = 1\nORDER BY A DESC\nLIMIT 5, 10");
//! ```
//!
//! A query bound to a model name can be executed through a
//! [`ModelRegistry`](crate::ModelRegistry) with [`Query::run`].

mod properties;

use crate::client::Connection;
use crate::condition::{Assertion, BoolOp, QueryCondition};
use crate::error::{OrmError, OrmResult};
use crate::model::{ModelCollection, ModelRegistry, Queryable};
use std::fmt;
use std::str::FromStr;

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(OrmError::invalid_argument(format!(
                "Invalid sort direction: '{s}'"
            ))),
        }
    }
}

/// One JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type keyword (`LEFT`, `INNER`, ...)
    pub kind: String,
    /// Joined table expression, also the join's identity
    pub table: String,
    /// ON conditions
    pub on: Vec<QueryCondition>,
}

impl Join {
    fn render(&self) -> String {
        let on = render_conditions(&self.on, "");
        format!("{} JOIN {} ON {}", self.kind, self.table, on)
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Option<SortDirection>,
}

/// LIMIT clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Limit {
    /// `LIMIT [offset, ]limit`
    Bounded { limit: u64, offset: Option<u64> },
    /// `LIMIT <raw>`
    Raw(String),
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Bounded {
                limit,
                offset: Some(offset),
            } => write!(f, "{offset}, {limit}"),
            Limit::Bounded {
                limit,
                offset: None,
            } => write!(f, "{limit}"),
            Limit::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Mutable SELECT builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// SELECT DISTINCT
    distinct: bool,
    /// Selected column expressions (empty selects `*`)
    fields: Vec<String>,
    /// FROM table expressions
    from: Vec<String>,
    /// JOIN clauses, keyed by table
    joins: Vec<Join>,
    /// WHERE conditions
    wheres: Vec<QueryCondition>,
    /// GROUP BY columns
    group_by: Vec<String>,
    /// ORDER BY items
    order_by: Vec<OrderBy>,
    /// LIMIT
    limit: Option<Limit>,
    /// Bound model name, used by `run`
    model: Option<String>,
}

fn to_conditions<C: Into<QueryCondition>>(on: impl IntoIterator<Item = C>) -> Vec<QueryCondition> {
    on.into_iter().map(Into::into).collect()
}

/// Render conditions, suppressing the operator of the first non-empty one.
fn render_conditions(conditions: &[QueryCondition], separator: &str) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(conditions.len());
    for cond in conditions.iter().filter(|c| !c.is_empty()) {
        clauses.push(cond.to_sql_string(clauses.is_empty()));
    }
    clauses.join(separator)
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Fields / FROM ====================

    /// Append one selected column.
    pub fn add_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.fields.push(field.into());
        self
    }

    /// Replace the selected columns.
    pub fn set_fields<S: Into<String>>(&mut self, fields: impl IntoIterator<Item = S>) -> &mut Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Append one FROM table expression.
    pub fn add_from(&mut self, from: impl Into<String>) -> &mut Self {
        self.from.push(from.into());
        self
    }

    // ==================== Joins ====================

    /// Add a join on `table`.
    ///
    /// When the table is already joined, its ON conditions are replaced if
    /// `override_existing` is set, and merged (skipping duplicates) otherwise.
    /// The existing join type is kept in both cases.
    pub fn add_join<C: Into<QueryCondition>>(
        &mut self,
        kind: &str,
        table: &str,
        on: impl IntoIterator<Item = C>,
        override_existing: bool,
    ) -> &mut Self {
        let on = to_conditions(on);
        match self.has_join(table) {
            None => self.joins.push(Join {
                kind: kind.to_string(),
                table: table.to_string(),
                on,
            }),
            Some(idx) if override_existing => self.joins[idx].on = on,
            Some(idx) => merge_conditions(&mut self.joins[idx].on, on),
        }
        self
    }

    /// [`Query::add_join`] replacing existing ON conditions.
    pub fn set_join<C: Into<QueryCondition>>(
        &mut self,
        kind: &str,
        table: &str,
        on: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        self.add_join(kind, table, on, true)
    }

    /// Insert a join in front of the others, without checking for an existing one.
    pub fn prepend_join<C: Into<QueryCondition>>(
        &mut self,
        kind: &str,
        table: &str,
        on: impl IntoIterator<Item = C>,
    ) -> &mut Self {
        self.joins.insert(
            0,
            Join {
                kind: kind.to_string(),
                table: table.to_string(),
                on: to_conditions(on),
            },
        );
        self
    }

    /// Remove the join on `table`. Returns whether one was found.
    pub fn remove_join(&mut self, table: &str) -> bool {
        match self.has_join(table) {
            Some(idx) => {
                self.joins.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Change the type of the join on `table`. Returns whether one was found.
    pub fn change_join_type(&mut self, table: &str, kind: &str) -> bool {
        match self.has_join(table) {
            Some(idx) => {
                self.joins[idx].kind = kind.to_string();
                true
            }
            None => false,
        }
    }

    /// Merge ON conditions into the join on `table`. Returns whether one was found.
    pub fn add_join_condition<C: Into<QueryCondition>>(
        &mut self,
        table: &str,
        on: impl IntoIterator<Item = C>,
    ) -> bool {
        match self.has_join(table) {
            Some(idx) => {
                merge_conditions(&mut self.joins[idx].on, to_conditions(on));
                true
            }
            None => false,
        }
    }

    /// Replace the ON conditions of the join on `table`. Returns whether one was found.
    pub fn set_join_condition<C: Into<QueryCondition>>(
        &mut self,
        table: &str,
        on: impl IntoIterator<Item = C>,
    ) -> bool {
        match self.has_join(table) {
            Some(idx) => {
                self.joins[idx].on = to_conditions(on);
                true
            }
            None => false,
        }
    }

    /// Position of the first join on `table`.
    pub fn has_join(&self, table: &str) -> Option<usize> {
        self.joins.iter().position(|j| j.table == table)
    }

    // ==================== Conditions ====================

    /// Append a WHERE condition unless an equal one is already present.
    pub fn add_where(&mut self, assertion: impl Into<Assertion>) -> &mut Self {
        self.add_where_with(assertion, BoolOp::And, false)
    }

    /// [`Query::add_where`] with an explicit operator and wrap flag.
    ///
    /// A [`QueryCondition`] passed in is stored as-is.
    pub fn add_where_with(
        &mut self,
        assertion: impl Into<Assertion>,
        operator: BoolOp,
        wrap: bool,
    ) -> &mut Self {
        let cond = make_condition(assertion.into(), operator, wrap);
        if !self.wheres.contains(&cond) {
            self.wheres.push(cond);
        }
        self
    }

    /// Insert a WHERE condition first unless an equal one is already present.
    pub fn prepend_where(&mut self, assertion: impl Into<Assertion>) -> &mut Self {
        self.prepend_where_with(assertion, BoolOp::And, false)
    }

    /// [`Query::prepend_where`] with an explicit operator and wrap flag.
    pub fn prepend_where_with(
        &mut self,
        assertion: impl Into<Assertion>,
        operator: BoolOp,
        wrap: bool,
    ) -> &mut Self {
        let cond = make_condition(assertion.into(), operator, wrap);
        if !self.wheres.contains(&cond) {
            self.wheres.insert(0, cond);
        }
        self
    }

    /// Nest a condition inside the WHERE condition at `position`.
    pub fn append_where(
        &mut self,
        position: usize,
        assertion: impl Into<Assertion>,
        operator: BoolOp,
        wrap: bool,
    ) -> OrmResult<&mut Self> {
        let len = self.wheres.len();
        let cond = self
            .wheres
            .get_mut(position)
            .ok_or(OrmError::OutOfBounds {
                index: position,
                len,
            })?;
        cond.add_condition(assertion, operator, wrap);
        Ok(self)
    }

    // ==================== Grouping / ordering / limit ====================

    pub fn add_group_by(&mut self, field: impl Into<String>) -> &mut Self {
        self.group_by.push(field.into());
        self
    }

    pub fn add_order_by(
        &mut self,
        field: impl Into<String>,
        direction: Option<SortDirection>,
    ) -> &mut Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// `LIMIT [offset, ]limit`
    pub fn set_limit(&mut self, limit: u64, offset: Option<u64>) -> &mut Self {
        self.limit = Some(Limit::Bounded { limit, offset });
        self
    }

    /// LIMIT with caller-supplied text.
    pub fn set_raw_limit(&mut self, limit: impl Into<String>) -> &mut Self {
        self.limit = Some(Limit::Raw(limit.into()));
        self
    }

    pub fn set_distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Bind the query to a registered model name.
    pub fn set_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.model = Some(model.into());
        self
    }

    // ==================== Accessors ====================

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn from_tables(&self) -> &[String] {
        &self.from
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn wheres(&self) -> &[QueryCondition] {
        &self.wheres
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    // ==================== Compilation ====================

    /// Compile to SQL, one clause per line.
    pub fn to_sql(&self) -> String {
        let mut sql = Vec::new();

        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        sql.push(format!("SELECT {distinct}{fields}"));
        sql.push(format!("FROM {}", self.from.join(", ")));

        for join in &self.joins {
            sql.push(join.render());
        }

        let wheres = render_conditions(&self.wheres, "\n");
        if !wheres.is_empty() {
            sql.push(format!("WHERE {wheres}"));
        }

        if !self.group_by.is_empty() {
            sql.push(format!("GROUP BY {}", self.group_by.join(", ")));
        }

        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .iter()
                .map(|o| match o.direction {
                    Some(dir) => format!("{} {dir}", o.field),
                    None => o.field.clone(),
                })
                .collect();
            sql.push(format!("ORDER BY {}", items.join(", ")));
        }

        if let Some(limit) = &self.limit {
            sql.push(format!("LIMIT {limit}"));
        }

        sql.join("\n")
    }

    /// Alias for [`Query::to_sql`].
    pub fn get_sql(&self) -> String {
        self.to_sql()
    }

    // ==================== Execution ====================

    /// Execute through the bound model's `find_by_query`.
    pub fn run(
        &self,
        registry: &ModelRegistry,
        conn: &dyn Connection,
    ) -> OrmResult<Option<ModelCollection>> {
        self.bound_model(registry)?.find_by_query(conn, self)
    }

    /// Count rows through the bound model's `find_count_by_query`.
    pub fn run_count(&self, registry: &ModelRegistry, conn: &dyn Connection) -> OrmResult<u64> {
        self.bound_model(registry)?.find_count_by_query(conn, self)
    }

    fn bound_model<'r>(&self, registry: &'r ModelRegistry) -> OrmResult<&'r dyn Queryable> {
        let name = self.model.as_deref().ok_or(OrmError::UnboundQuery)?;
        registry
            .get(name)
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn make_condition(assertion: Assertion, operator: BoolOp, wrap: bool) -> QueryCondition {
    match assertion {
        Assertion::Condition(cond) => cond,
        other => QueryCondition::with(other, operator, wrap),
    }
}

fn merge_conditions(existing: &mut Vec<QueryCondition>, incoming: Vec<QueryCondition>) {
    for cond in incoming {
        if !existing.contains(&cond) {
            existing.push(cond);
        }
    }
}

#[cfg(test)]
mod tests;
