use super::collection::ModelCollection;
use super::schema::ModelSchema;
use crate::client::Connection;
use crate::error::OrmResult;
use crate::query::Query;
use std::collections::HashMap;
use std::sync::Arc;

/// Something a bound [`Query`] can be run against.
pub trait Queryable: Send + Sync {
    /// Name a query binds to.
    fn model_name(&self) -> &str;

    /// Instances selected by the compiled query.
    fn find_by_query(
        &self,
        conn: &dyn Connection,
        query: &Query,
    ) -> OrmResult<Option<ModelCollection>>;

    /// Number of rows the query would return.
    fn find_count_by_query(&self, conn: &dyn Connection, query: &Query) -> OrmResult<u64>;
}

impl Queryable for Arc<ModelSchema> {
    fn model_name(&self) -> &str {
        self.name()
    }

    fn find_by_query(
        &self,
        conn: &dyn Connection,
        query: &Query,
    ) -> OrmResult<Option<ModelCollection>> {
        ModelSchema::find_by_query(self, conn, query)
    }

    fn find_count_by_query(&self, conn: &dyn Connection, query: &Query) -> OrmResult<u64> {
        ModelSchema::find_count_by_query(self, conn, query)
    }
}

/// Registration entry for models linked into the binary.
///
/// ```ignore
/// fn register_users(registry: &mut ModelRegistry) {
///     registry.register_schema(ModelSchema::builder("User", "USERS").pk("ID").build());
/// }
///
/// inventory::submit! {
///     ModelRegistration { register_fn: register_users }
/// }
/// ```
pub struct ModelRegistration {
    /// Function that registers one or more models.
    pub register_fn: fn(&mut ModelRegistry),
}

inventory::collect!(ModelRegistration);

/// Models by name, for running bound queries.
#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Queryable>>,
    schemas: HashMap<String, Arc<ModelSchema>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every submitted [`ModelRegistration`].
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for reg in inventory::iter::<ModelRegistration> {
            (reg.register_fn)(&mut registry);
        }
        tracing::debug!(target: "foundation.model", models = registry.len(), "model registry loaded");
        registry
    }

    /// Register a schema under its name and return the shared handle.
    pub fn register_schema(&mut self, schema: ModelSchema) -> Arc<ModelSchema> {
        let schema = Arc::new(schema);
        self.register(Arc::clone(&schema));
        self.schemas
            .insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Register any [`Queryable`] under its model name.
    pub fn register<Q: Queryable + 'static>(&mut self, model: Q) {
        let name = model.model_name().to_string();
        if self.models.insert(name.clone(), Arc::new(model)).is_some() {
            tracing::warn!(target: "foundation.model", model = %name, "model registered twice, replacing");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Queryable> {
        self.models.get(name).map(|m| m.as_ref())
    }

    /// Schema registered through [`ModelRegistry::register_schema`].
    pub fn schema(&self, name: &str) -> Option<Arc<ModelSchema>> {
        self.schemas.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.names())
            .finish()
    }
}
