//! Handle trait implementations for [`ReconnectProxy`]
//!
//! Attributes are read straight from the wrapped handle, methods are
//! resolved by name through `attr`, and subscript accessors hand out nested
//! proxies.

use std::sync::Arc;

use reconnect_core::{Collection, Connection, Database, Document, Result};
use serde_json::Value;

use super::ReconnectProxy;

impl<T: Connection + ?Sized> ReconnectProxy<T> {
    /// `conn[name]`, returned as a proxy
    pub fn database_proxy(&self, name: &str) -> Result<ReconnectProxy<dyn Database>> {
        self.index(|conn| conn.database(name))
    }
}

impl<T: Database + ?Sized> ReconnectProxy<T> {
    /// `db[name]`, returned as a proxy
    pub fn collection_proxy(&self, name: &str) -> Result<ReconnectProxy<dyn Collection>> {
        self.index(|db| db.collection(name))
    }
}

impl<T: Connection + ?Sized> Connection for ReconnectProxy<T> {
    fn host(&self) -> &str {
        self.inner().host()
    }

    fn port(&self) -> u16 {
        self.inner().port()
    }

    fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        Ok(Arc::new(self.database_proxy(name)?))
    }

    fn database_names(&self) -> Result<Vec<String>> {
        self.attr("database_names").call(|conn| conn.database_names())
    }

    fn server_info(&self) -> Result<Document> {
        self.attr("server_info").call(|conn| conn.server_info())
    }

    fn drop_database(&self, name: &str) -> Result<()> {
        self.attr("drop_database").call(|conn| conn.drop_database(name))
    }

    fn close(&self) -> Result<()> {
        self.attr("close").call(|conn| conn.close())
    }
}

impl<T: Database + ?Sized> Database for ReconnectProxy<T> {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        Ok(Arc::new(self.collection_proxy(name)?))
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        self.attr("collection_names").call(|db| db.collection_names())
    }

    fn command(&self, command: &Document) -> Result<Document> {
        self.attr("command").call(|db| db.command(command))
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        self.attr("drop_collection").call(|db| db.drop_collection(name))
    }
}

impl<T: Collection + ?Sized> Collection for ReconnectProxy<T> {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn full_name(&self) -> String {
        self.inner().full_name()
    }

    fn find(&self, filter: &Document) -> Result<Vec<Document>> {
        self.attr("find").call(|coll| coll.find(filter))
    }

    fn find_one(&self, filter: &Document) -> Result<Option<Document>> {
        self.attr("find_one").call(|coll| coll.find_one(filter))
    }

    fn insert(&self, document: Document) -> Result<Value> {
        // Each attempt needs its own copy of the document
        self.attr("insert").call(|coll| coll.insert(document.clone()))
    }

    fn update(&self, filter: &Document, update: &Document, upsert: bool) -> Result<u64> {
        self.attr("update").call(|coll| coll.update(filter, update, upsert))
    }

    fn remove(&self, filter: &Document) -> Result<u64> {
        self.attr("remove").call(|coll| coll.remove(filter))
    }

    fn count(&self) -> Result<u64> {
        self.attr("count").call(|coll| coll.count())
    }

    fn distinct(&self, key: &str) -> Result<Vec<Value>> {
        self.attr("distinct").call(|coll| coll.distinct(key))
    }

    fn ensure_index(&self, key: &str) -> Result<String> {
        self.attr("ensure_index").call(|coll| coll.ensure_index(key))
    }

    fn index_information(&self) -> Result<Vec<String>> {
        self.attr("index_information").call(|coll| coll.index_information())
    }
}
