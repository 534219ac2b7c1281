//! Handle traits for a document-database client
//!
//! A client is a small object graph: a [`Connection`] hands out
//! [`Database`] handles by name, and a database hands out [`Collection`]
//! handles. Every handle also implements [`Handle`], which carries the
//! generic, reflective part of the surface.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::surface::{Member, SurfaceDescriptor};
use crate::{DriverError, Result};

/// A stored or queried document
pub type Document = Value;

/// Behaviour shared by every client handle
pub trait Handle: fmt::Display + fmt::Debug + Send + Sync {
    /// The member surface of this handle's type
    fn surface(&self) -> &'static SurfaceDescriptor;

    /// Names of the members exposed by this handle
    fn members(&self) -> &'static [Member] {
        self.surface().members()
    }

    /// Invoke the handle itself
    ///
    /// Handles are not callable unless an implementation says otherwise.
    fn invoke(&self, _args: &[Document]) -> Result<Document> {
        Err(DriverError::NotCallable(self.surface().name().to_string()))
    }

    /// Evaluate the handle in a boolean context
    fn truthy(&self) -> bool {
        true
    }
}

/// A collection of documents
pub trait Collection: Handle {
    /// Short collection name
    fn name(&self) -> &str;

    /// `<database>.<collection>`
    fn full_name(&self) -> String;

    /// Documents matching every field of `filter`
    fn find(&self, filter: &Document) -> Result<Vec<Document>>;

    /// First document matching `filter`
    fn find_one(&self, filter: &Document) -> Result<Option<Document>>;

    /// Insert a document and return its `_id`
    fn insert(&self, document: Document) -> Result<Value>;

    /// Merge `update` into documents matching `filter`.
    ///
    /// Returns the number of documents modified or inserted.
    fn update(&self, filter: &Document, update: &Document, upsert: bool) -> Result<u64>;

    /// Remove documents matching `filter`, returning how many were removed
    fn remove(&self, filter: &Document) -> Result<u64>;

    fn count(&self) -> Result<u64>;

    /// Distinct values stored under `key`
    fn distinct(&self, key: &str) -> Result<Vec<Value>>;

    /// Create an index on `key` if missing and return its name
    fn ensure_index(&self, key: &str) -> Result<String>;

    fn index_information(&self) -> Result<Vec<String>>;
}

/// A named database
pub trait Database: Handle {
    fn name(&self) -> &str;

    /// Subscript access to a collection handle
    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>>;

    fn collection_names(&self) -> Result<Vec<String>>;

    /// Run a database command
    fn command(&self, command: &Document) -> Result<Document>;

    fn drop_collection(&self, name: &str) -> Result<()>;
}

/// A connection to a database cluster
pub trait Connection: Handle {
    fn host(&self) -> &str;

    fn port(&self) -> u16;

    /// Subscript access to a database handle
    fn database(&self, name: &str) -> Result<Arc<dyn Database>>;

    fn database_names(&self) -> Result<Vec<String>>;

    fn server_info(&self) -> Result<Document>;

    fn drop_database(&self, name: &str) -> Result<()>;

    /// Close the connection
    fn close(&self) -> Result<()>;
}
