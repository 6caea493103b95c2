//! Boolean conditions for WHERE and JOIN ... ON clauses.
//!
//! A [`QueryCondition`] is either a literal SQL fragment or a group of child
//! conditions. Every condition carries the boolean operator that links it to
//! the clause before it, and a flag telling whether it renders inside
//! parentheses.
//!
//! ```ignore
//! use foundation::{BoolOp, QueryCondition};
//!
//! let cond = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::Or, false);
//! assert_eq!(cond.to_sql_string(false), " OR (A = 1 AND B = 2)");
//!
//! let mut cond = QueryCondition::new("A = 1");
//! cond.add_condition("B = 2", BoolOp::Or, false);
//! assert_eq!(cond.to_string(), "(A = 1 OR B = 2)");
//! ```

use crate::error::{OrmError, OrmResult};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

/// Boolean operator linking a condition to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
    Xor,
    Not,
}

impl BoolOp {
    /// SQL keyword for the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
            BoolOp::Xor => "XOR",
            BoolOp::Not => "NOT",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoolOp {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(BoolOp::And),
            "OR" => Ok(BoolOp::Or),
            "XOR" => Ok(BoolOp::Xor),
            "NOT" => Ok(BoolOp::Not),
            _ => Err(OrmError::InvalidOperator(s.to_string())),
        }
    }
}

/// Input accepted when building a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// A literal SQL fragment.
    Sql(String),
    /// An already-built condition.
    Condition(QueryCondition),
    /// A sequence of assertions that becomes a parenthesized group.
    Group(Vec<Assertion>),
}

impl From<&str> for Assertion {
    fn from(s: &str) -> Self {
        Assertion::Sql(s.to_string())
    }
}

impl From<String> for Assertion {
    fn from(s: String) -> Self {
        Assertion::Sql(s)
    }
}

impl From<QueryCondition> for Assertion {
    fn from(c: QueryCondition) -> Self {
        Assertion::Condition(c)
    }
}

impl<T: Into<Assertion>> From<Vec<T>> for Assertion {
    fn from(items: Vec<T>) -> Self {
        Assertion::Group(items.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Assertions {
    Literal(String),
    Group(Vec<QueryCondition>),
}

/// A boolean clause or a group of clauses.
///
/// Equality is structural: two conditions built from the same inputs compare
/// equal, which is what [`Query`](crate::Query) relies on to skip duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    assertions: Assertions,
    operator: BoolOp,
    wrap: bool,
}

impl QueryCondition {
    /// Literal condition joined with AND, not wrapped.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            assertions: Assertions::Literal(sql.into()),
            operator: BoolOp::And,
            wrap: false,
        }
    }

    /// Build a condition from any assertion.
    ///
    /// A group assertion always wraps, whatever `wrap` says. Its first item
    /// inherits `operator` and `wrap` (the operator is never rendered for a
    /// leading item); later plain items are joined with AND. Items that are
    /// already conditions keep their own operator and wrap flag.
    ///
    /// An [`Assertion::Condition`] becomes a single-child group that wraps only
    /// if asked to.
    pub fn with(assertion: impl Into<Assertion>, operator: BoolOp, wrap: bool) -> Self {
        match assertion.into() {
            Assertion::Sql(sql) => Self {
                assertions: Assertions::Literal(sql),
                operator,
                wrap,
            },
            Assertion::Condition(cond) => Self {
                assertions: Assertions::Group(vec![cond]),
                operator,
                wrap,
            },
            Assertion::Group(items) => {
                let children = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let (op, wr) = if i == 0 {
                            (operator, wrap)
                        } else {
                            (BoolOp::And, false)
                        };
                        match item {
                            Assertion::Condition(cond) => cond,
                            other => Self::with(other, op, wr),
                        }
                    })
                    .collect();
                Self {
                    assertions: Assertions::Group(children),
                    operator,
                    wrap: true,
                }
            }
        }
    }

    /// A parenthesized group joined with AND.
    ///
    /// The leading item of a sequence is not wrapped on its own.
    pub fn group(items: impl Into<Assertion>) -> Self {
        match items.into() {
            items @ Assertion::Group(_) => Self::with(items, BoolOp::And, false),
            single => Self::with(single, BoolOp::And, true),
        }
    }

    /// A condition joined with OR.
    pub fn or(assertion: impl Into<Assertion>) -> Self {
        Self::with(assertion, BoolOp::Or, false)
    }

    /// A condition joined with XOR.
    pub fn xor(assertion: impl Into<Assertion>) -> Self {
        Self::with(assertion, BoolOp::Xor, false)
    }

    /// A condition joined with NOT.
    pub fn not(assertion: impl Into<Assertion>) -> Self {
        Self::with(assertion, BoolOp::Not, false)
    }

    /// An empty group, to be filled with [`QueryCondition::add_condition`].
    pub fn empty(operator: BoolOp, wrap: bool) -> Self {
        Self {
            assertions: Assertions::Group(Vec::new()),
            operator,
            wrap,
        }
    }

    /// Set the wrap flag.
    pub fn wrapped(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Append a child condition.
    ///
    /// A literal condition is first turned into a one-item group. A group that
    /// already holds something is wrapped from then on.
    pub fn add_condition(
        &mut self,
        assertion: impl Into<Assertion>,
        operator: BoolOp,
        wrap: bool,
    ) -> &mut Self {
        if let Assertions::Literal(sql) = &mut self.assertions {
            let first = QueryCondition::new(std::mem::take(sql));
            self.assertions = Assertions::Group(vec![first]);
        }
        if let Assertions::Group(children) = &mut self.assertions {
            if !children.is_empty() {
                self.wrap = true;
            }
            children.push(Self::with(assertion, operator, wrap));
        }
        self
    }

    /// Whether the condition holds nothing to render.
    pub fn is_empty(&self) -> bool {
        match &self.assertions {
            Assertions::Literal(sql) => sql.trim().is_empty(),
            Assertions::Group(children) => children.is_empty(),
        }
    }

    /// The operator linking this condition to the previous clause.
    pub fn operator(&self) -> BoolOp {
        self.operator
    }

    /// Whether the condition renders inside parentheses.
    pub fn is_wrapped(&self) -> bool {
        self.wrap
    }

    /// Child conditions (empty for a literal).
    pub fn children(&self) -> &[QueryCondition] {
        match &self.assertions {
            Assertions::Literal(_) => &[],
            Assertions::Group(children) => children,
        }
    }

    /// Render as SQL.
    ///
    /// Unless `suppress_operator` is set, the result starts with
    /// `" {operator} "` so consecutive conditions can be concatenated.
    pub fn to_sql_string(&self, suppress_operator: bool) -> String {
        let mut sql = match &self.assertions {
            Assertions::Literal(sql) => sql.clone(),
            Assertions::Group(children) => {
                let mut iter = children.iter();
                let mut sql = iter
                    .next()
                    .map(|first| first.to_sql_string(true))
                    .unwrap_or_default();
                for child in iter {
                    sql.push_str(&child.to_sql_string(false));
                }
                sql
            }
        };

        if self.wrap {
            sql = format!("({sql})");
        }
        if !suppress_operator {
            sql = format!(" {} {sql}", self.operator);
        }
        sql
    }

    /// Build a condition from a loosely-shaped JSON value.
    ///
    /// - a string is a literal condition;
    /// - an array is a group whose items are strings or argument tuples
    ///   `[assertion, operator?, wrap?]` (the first item inherits `operator`
    ///   and `wrap` when the tuple omits them).
    ///
    /// Any other shape, or a `null` item, is an [`OrmError::InvalidArgument`];
    /// an unknown operator is an [`OrmError::InvalidOperator`].
    pub fn from_json(value: &Json, operator: BoolOp, wrap: bool) -> OrmResult<Self> {
        match value {
            Json::String(sql) => Ok(Self::with(sql.as_str(), operator, wrap)),
            Json::Array(items) => {
                let mut children = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let (op, wr) = if i == 0 {
                        (operator, wrap)
                    } else {
                        (BoolOp::And, false)
                    };
                    let child = match item {
                        Json::Null => {
                            return Err(OrmError::invalid_argument("Invalid assertion parameter"));
                        }
                        Json::String(sql) => Self::with(sql.as_str(), op, wr),
                        Json::Array(args) => Self::from_json_args(args, op, wr)?,
                        other => return Err(invalid_assertion_type(other)),
                    };
                    children.push(child);
                }
                Ok(Self {
                    assertions: Assertions::Group(children),
                    operator,
                    wrap: true,
                })
            }
            other => Err(invalid_assertion_type(other)),
        }
    }

    /// Build a condition from an argument tuple `[assertion, operator?, wrap?]`.
    ///
    /// Missing or `null` operator/wrap entries fall back to the given defaults.
    pub fn from_json_args(args: &[Json], operator: BoolOp, wrap: bool) -> OrmResult<Self> {
        let assertion = match args.first() {
            None | Some(Json::Null) => {
                return Err(OrmError::invalid_argument("Invalid assertion parameter"));
            }
            Some(a) => a,
        };
        let operator = match args.get(1) {
            None | Some(Json::Null) => operator,
            Some(Json::String(op)) => op.parse()?,
            Some(other) => return Err(OrmError::InvalidOperator(other.to_string())),
        };
        let wrap = match args.get(2) {
            None | Some(Json::Null) => wrap,
            Some(Json::Bool(b)) => *b,
            Some(other) => {
                return Err(OrmError::invalid_argument(format!(
                    "wrap flag must be a boolean, got {other}"
                )));
            }
        };
        Self::from_json(assertion, operator, wrap)
    }
}

fn invalid_assertion_type(value: &Json) -> OrmError {
    let kind = match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    OrmError::invalid_argument(format!("Invalid assertion type: '{kind}'"))
}

impl fmt::Display for QueryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_string(true))
    }
}

impl From<&str> for QueryCondition {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for QueryCondition {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_renders_verbatim() {
        let cond = QueryCondition::new("A = 1");
        assert_eq!(cond.to_sql_string(true), "A = 1");
        assert_eq!(cond.to_sql_string(false), " AND A = 1");
        assert!(!cond.is_wrapped());
    }

    #[test]
    fn test_literal_wrap_adds_one_pair() {
        let cond = QueryCondition::with("A = 1", BoolOp::Or, true);
        assert_eq!(cond.to_sql_string(true), "(A = 1)");
        assert_eq!(cond.to_sql_string(false), " OR (A = 1)");
    }

    #[test]
    fn test_group_always_wraps() {
        let cond = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::Or, false);
        assert!(cond.is_wrapped());
        assert_eq!(cond.to_sql_string(true), "(A = 1 AND B = 2)");
        assert_eq!(cond.to_sql_string(false), " OR (A = 1 AND B = 2)");
    }

    #[test]
    fn test_first_child_inherits_operator_and_wrap() {
        let cond = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::Or, true);
        let first = &cond.children()[0];
        assert_eq!(first.operator(), BoolOp::Or);
        assert!(first.is_wrapped());
        let second = &cond.children()[1];
        assert_eq!(second.operator(), BoolOp::And);
        assert!(!second.is_wrapped());
        assert_eq!(cond.to_sql_string(true), "((A = 1) AND B = 2)");
    }

    #[test]
    fn test_nested_groups() {
        let cond = QueryCondition::group(Assertion::Group(vec![
            "A = 1".into(),
            QueryCondition::or(vec!["B = 2", "C = 3"]).into(),
        ]));
        assert_eq!(cond.to_string(), "(A = 1 OR (B = 2 AND C = 3))");
    }

    #[test]
    fn test_group_of_literal_still_wraps() {
        let cond = QueryCondition::group("A = 1");
        assert!(cond.is_wrapped());
        assert_eq!(cond.to_string(), "(A = 1)");
        let pair = QueryCondition::group(vec!["A = 1", "B = 2"]);
        assert!(!pair.children()[0].is_wrapped());
        assert_eq!(pair.to_string(), "(A = 1 AND B = 2)");
    }

    #[test]
    fn test_condition_assertion_keeps_wrap_choice() {
        let inner = QueryCondition::new("A = 1");
        let cond = QueryCondition::with(inner.clone(), BoolOp::Or, false);
        assert!(!cond.is_wrapped());
        assert_eq!(cond.to_sql_string(false), " OR A = 1");
        assert_eq!(cond.children(), &[inner]);
    }

    #[test]
    fn test_add_condition_promotes_literal() {
        let mut cond = QueryCondition::new("A = 1");
        cond.add_condition("B = 2", BoolOp::Or, false)
            .add_condition(vec!["C = 3", "D = 4"], BoolOp::And, false);
        assert!(cond.is_wrapped());
        assert_eq!(cond.to_string(), "(A = 1 OR B = 2 AND (C = 3 AND D = 4))");
    }

    #[test]
    fn test_empty_builder() {
        let mut cond = QueryCondition::empty(BoolOp::Or, false);
        assert!(cond.is_empty());
        cond.add_condition("A = 1", BoolOp::And, false);
        assert!(!cond.is_empty());
        assert!(!cond.is_wrapped());
        assert_eq!(cond.to_sql_string(false), " OR A = 1");

        cond.add_condition("B = 2", BoolOp::Xor, false);
        assert_eq!(cond.to_sql_string(false), " OR (A = 1 XOR B = 2)");
    }

    #[test]
    fn test_structural_equality() {
        let a = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::Or, false);
        let b = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::Or, false);
        let c = QueryCondition::with(vec!["A = 1", "B = 2"], BoolOp::And, false);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("xor".parse::<BoolOp>().unwrap(), BoolOp::Xor);
        assert!(matches!(
            "NAND".parse::<BoolOp>(),
            Err(OrmError::InvalidOperator(op)) if op == "NAND"
        ));
    }

    #[test]
    fn test_from_json_tuples() {
        let cond = QueryCondition::from_json(
            &json!(["A = 1", ["B = 2", "OR"], [["C = 3", "D = 4"], "AND"]]),
            BoolOp::And,
            false,
        )
        .unwrap();
        assert_eq!(cond.to_string(), "(A = 1 OR B = 2 AND (C = 3 AND D = 4))");
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        let err = QueryCondition::from_json(&json!(42), BoolOp::And, false).unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(msg) if msg.contains("number")));

        let err = QueryCondition::from_json(&json!(["A = 1", null]), BoolOp::And, false)
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(_)));

        let err = QueryCondition::from_json(&json!([["A = 1", "MAYBE"]]), BoolOp::And, false)
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidOperator(_)));
    }
}
