use super::attributes::normalize;
use crate::error::{OrmError, OrmResult};

/// Column holding the soft-delete flag.
pub const DELETED_FIELD: &str = "DELETED";

/// Table-wide description of a model: where it lives and how it behaves.
///
/// Build one with [`ModelSchema::builder`], wrap it in an `Arc`, and use the
/// finder/mutator methods on the `Arc` (see [`Model`](crate::Model)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    pub(crate) name: String,
    pub(crate) table: String,
    pub(crate) pk: Option<String>,
    pub(crate) autoset_pk: bool,
    pub(crate) fields: Vec<String>,
    pub(crate) soft_delete: bool,
    pub(crate) read_only: bool,
    pub(crate) debug: bool,
}

impl ModelSchema {
    /// Start describing model `name` stored in `table`.
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            schema: ModelSchema {
                name: name.into(),
                table: table.into(),
                pk: None,
                autoset_pk: true,
                fields: Vec::new(),
                soft_delete: false,
                read_only: false,
                debug: false,
            },
        }
    }

    /// Registry name of the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary-key column (upper case).
    pub fn pk(&self) -> Option<&str> {
        self.pk.as_deref()
    }

    /// Whether the datastore assigns primary-key values.
    pub fn autoset_pk(&self) -> bool {
        self.autoset_pk
    }

    /// Declared fields (upper case); empty means any field is accepted.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn soft_delete(&self) -> bool {
        self.soft_delete
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether `field` may be stored on instances of this model.
    pub fn accepts_field(&self, field: &str) -> bool {
        if self.fields.is_empty() {
            return true;
        }
        let field = normalize(field);
        self.fields.iter().any(|f| *f == field)
    }

    /// Whether `field` is the primary key.
    pub fn is_pk(&self, field: &str) -> bool {
        self.pk.as_deref().is_some_and(|pk| pk == normalize(field))
    }

    pub(crate) fn require_pk(&self) -> OrmResult<&str> {
        self.pk
            .as_deref()
            .ok_or_else(|| OrmError::MissingPrimaryKey(self.name.clone()))
    }

    pub(crate) fn ensure_writable(&self) -> OrmResult<()> {
        if self.read_only {
            return Err(OrmError::ReadOnly(self.name.clone()));
        }
        Ok(())
    }

    /// Log generated SQL at `debug` for debug-enabled models, `trace` otherwise.
    pub(crate) fn log_sql(&self, sql: &str) {
        if self.debug {
            tracing::debug!(target: "foundation.model", model = %self.name, sql = %sql, "model query");
        } else {
            tracing::trace!(target: "foundation.model", model = %self.name, sql = %sql, "model query");
        }
    }
}

/// Builder for [`ModelSchema`].
#[derive(Debug, Clone)]
pub struct ModelSchemaBuilder {
    schema: ModelSchema,
}

impl ModelSchemaBuilder {
    /// Primary-key column.
    pub fn pk(mut self, pk: &str) -> Self {
        self.schema.pk = Some(normalize(pk));
        self
    }

    /// Whether the datastore assigns the primary key (default `true`).
    pub fn autoset_pk(mut self, autoset: bool) -> Self {
        self.schema.autoset_pk = autoset;
        self
    }

    /// Declare the field set.
    pub fn fields<S: AsRef<str>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.schema.fields = fields.into_iter().map(|f| normalize(f.as_ref())).collect();
        self
    }

    /// Mark rows deleted through a `DELETED` flag instead of removing them.
    pub fn soft_delete(mut self, soft_delete: bool) -> Self {
        self.schema.soft_delete = soft_delete;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.schema.read_only = read_only;
        self
    }

    /// Log this model's generated SQL at `debug` level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.schema.debug = debug;
        self
    }

    pub fn build(self) -> ModelSchema {
        let mut schema = self.schema;
        if !schema.fields.is_empty() {
            let mut implied = Vec::new();
            if let Some(pk) = &schema.pk {
                implied.push(pk.clone());
            }
            if schema.soft_delete {
                implied.push(DELETED_FIELD.to_string());
            }
            for field in implied {
                if !schema.fields.contains(&field) {
                    schema.fields.push(field);
                }
            }
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_normalizes_and_implies_fields() {
        let schema = ModelSchema::builder("Post", "POSTS")
            .pk("id")
            .fields(["title", "body"])
            .soft_delete(true)
            .build();
        assert_eq!(schema.pk(), Some("ID"));
        assert_eq!(schema.fields(), ["TITLE", "BODY", "ID", "DELETED"]);
        assert!(schema.accepts_field("Title"));
        assert!(!schema.accepts_field("author"));
        assert!(schema.is_pk("id"));
    }

    #[test]
    fn test_open_field_set_accepts_anything() {
        let schema = ModelSchema::builder("Log", "LOGS").build();
        assert!(schema.accepts_field("whatever"));
        assert!(matches!(
            schema.require_pk(),
            Err(OrmError::MissingPrimaryKey(name)) if name == "Log"
        ));
    }
}
