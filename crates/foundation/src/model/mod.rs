//! Active-record models.
//!
//! A [`ModelSchema`] describes a table (name, primary key, declared fields,
//! soft-delete and read-only flags). Held in an `Arc`, it provides the finders
//! and bulk mutators; each row becomes a [`Model`] instance that tracks its
//! changed fields and saves itself.
//!
//! ```ignore
//! use foundation::prelude::*;
//!
//! let posts = Arc::new(
//!     ModelSchema::builder("Post", "POSTS")
//!         .pk("ID")
//!         .fields(["TITLE", "AUTHOR_ID"])
//!         .soft_delete(true)
//!         .build(),
//! );
//!
//! // SELECT * FROM POSTS WHERE AUTHOR_ID IN(1,2,3) AND DELETED = 0
//! let found = posts.find_by(&conn, "AUTHOR_ID", vec![1, 2, 3], &FindOptions::new())?;
//!
//! // UPDATE POSTS SET DELETED = 1 WHERE ID = 7
//! posts.destroy(&conn, 7, None)?;
//! ```

mod attributes;
mod collection;
mod finders;
mod instance;
mod mutations;
mod registry;
mod schema;

pub use attributes::Attributes;
pub use collection::ModelCollection;
pub use finders::FindOptions;
pub use instance::Model;
pub use mutations::UpdateOutcome;
pub use registry::{ModelRegistration, ModelRegistry, Queryable};
pub use schema::{DELETED_FIELD, ModelSchema, ModelSchemaBuilder};
