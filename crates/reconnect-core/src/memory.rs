//! In-memory client with scripted failures
//!
//! `MemoryConnection` implements the handle traits over process-local
//! storage. A shared [`FaultPlan`] can make named operations fail a fixed
//! number of times, which is how failover behaviour is exercised without a
//! real cluster.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value, json};

use crate::client::{Collection, Connection, Database, Document, Handle};
use crate::surface::{
    COLLECTION_SURFACE, CONNECTION_SURFACE, DATABASE_SURFACE, SurfaceDescriptor,
};
use crate::{DriverError, Result, driver};


/// Failures scripted per operation name
#[derive(Debug, Default)]
pub struct FaultPlan {
    queued: Mutex<HashMap<String, VecDeque<DriverError>>>,
    sticky: Mutex<HashMap<String, DriverError>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl FaultPlan {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` calls of `operation` with `error`
    pub fn fail_times(&self, operation: &str, times: u32, error: DriverError) {
        let mut queued = self.queued.lock();
        let queue = queued.entry(operation.to_string()).or_default();
        queue.extend(std::iter::repeat_n(error, times as usize));
    }

    /// Fail every call of `operation` until [`FaultPlan::clear`]
    pub fn fail_always(&self, operation: &str, error: DriverError) {
        self.sticky.lock().insert(operation.to_string(), error);
    }

    /// Drop all scripted failures; call counters are kept
    pub fn clear(&self) {
        self.queued.lock().clear();
        self.sticky.lock().clear();
    }

    /// Number of times `operation` has been called
    pub fn calls(&self, operation: &str) -> u32 {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Record a call and return the scripted failure, if any
    fn check(&self, operation: &str) -> Result<()> {
        *self.calls.lock().entry(operation.to_string()).or_insert(0) += 1;

        let scripted = match self.sticky.lock().get(operation) {
            Some(err) => Some(err.clone()),
            None => self
                .queued
                .lock()
                .get_mut(operation)
                .and_then(VecDeque::pop_front),
        };
        match scripted {
            Some(err) => {
                tracing::debug!(operation, error = %err, "injecting scripted failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Document>,
    indexes: Vec<String>,
    next_id: u64,
}

type Storage = RwLock<BTreeMap<String, BTreeMap<String, CollectionData>>>;

/// State shared by every handle derived from one connection
struct Shared {
    host: String,
    port: u16,
    storage: Storage,
    plan: Arc<FaultPlan>,
    closed: AtomicBool,
}

impl Shared {
    /// Gate every operation: scripted failures first, then the closed flag
    fn enter(&self, operation: &str) -> Result<()> {
        self.plan.check(operation)?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::ConnectionFailure(format!(
                "connection to {}:{} is closed",
                self.host, self.port
            )));
        }
        Ok(())
    }
}

/// In-memory connection
#[derive(Clone)]
pub struct MemoryConnection {
    shared: Arc<Shared>,
}

impl MemoryConnection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_fault_plan(host, port, FaultPlan::new())
    }

    pub fn with_fault_plan(host: impl Into<String>, port: u16, plan: Arc<FaultPlan>) -> Self {
        Self {
            shared: Arc::new(Shared {
                host: host.into(),
                port,
                storage: RwLock::new(BTreeMap::new()),
                plan,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Open a connection from a `mongodb://` URI
    pub fn open(uri: &str) -> Result<Self> {
        let (host, port) = driver::parse_uri(uri)?;
        Ok(Self::new(host, port))
    }

    pub fn fault_plan(&self) -> &Arc<FaultPlan> {
        &self.shared.plan
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Display for MemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection('{}', {})", self.shared.host, self.shared.port)
    }
}

impl fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("host", &self.shared.host)
            .field("port", &self.shared.port)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Handle for MemoryConnection {
    fn surface(&self) -> &'static SurfaceDescriptor {
        &CONNECTION_SURFACE
    }
}

impl Connection for MemoryConnection {
    fn host(&self) -> &str {
        &self.shared.host
    }

    fn port(&self) -> u16 {
        self.shared.port
    }

    fn database(&self, name: &str) -> Result<Arc<dyn Database>> {
        validate_name(name)?;
        Ok(Arc::new(MemoryDatabase {
            shared: self.shared.clone(),
            connection: self.to_string(),
            name: name.to_string(),
        }))
    }

    fn database_names(&self) -> Result<Vec<String>> {
        self.shared.enter("database_names")?;
        Ok(self.shared.storage.read().keys().cloned().collect())
    }

    fn server_info(&self) -> Result<Document> {
        self.shared.enter("server_info")?;
        Ok(json!({ "version": driver::version(), "ok": 1 }))
    }

    fn drop_database(&self, name: &str) -> Result<()> {
        self.shared.enter("drop_database")?;
        self.shared.storage.write().remove(name);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.shared.plan.check("close")?;
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory database handle
pub struct MemoryDatabase {
    shared: Arc<Shared>,
    connection: String,
    name: String,
}

impl fmt::Display for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database({}, '{}')", self.connection, self.name)
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("name", &self.name)
            .finish()
    }
}

impl Handle for MemoryDatabase {
    fn surface(&self) -> &'static SurfaceDescriptor {
        &DATABASE_SURFACE
    }
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>> {
        validate_name(name)?;
        Ok(Arc::new(MemoryCollection {
            shared: self.shared.clone(),
            database: self.to_string(),
            database_name: self.name.clone(),
            name: name.to_string(),
        }))
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        self.shared.enter("collection_names")?;
        Ok(self
            .shared
            .storage
            .read()
            .get(&self.name)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn command(&self, command: &Document) -> Result<Document> {
        self.shared.enter("command")?;

        if command.get("ping").is_some() {
            return Ok(json!({ "ok": 1 }));
        }
        if let Some(collection) = command.get("count").and_then(Value::as_str) {
            let storage = self.shared.storage.read();
            let n = storage
                .get(&self.name)
                .and_then(|collections| collections.get(collection))
                .map_or(0, |data| data.documents.len());
            return Ok(json!({ "n": n, "ok": 1 }));
        }
        Err(DriverError::OperationFailure(format!(
            "no such command: {}",
            command
        )))
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        self.shared.enter("drop_collection")?;
        if let Some(collections) = self.shared.storage.write().get_mut(&self.name) {
            collections.remove(name);
        }
        Ok(())
    }
}

/// In-memory collection handle
pub struct MemoryCollection {
    shared: Arc<Shared>,
    database: String,
    database_name: String,
    name: String,
}

impl MemoryCollection {
    fn read<T>(&self, f: impl FnOnce(Option<&CollectionData>) -> T) -> T {
        let storage = self.shared.storage.read();
        f(storage
            .get(&self.database_name)
            .and_then(|collections| collections.get(&self.name)))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CollectionData) -> T) -> T {
        let mut storage = self.shared.storage.write();
        let data = storage
            .entry(self.database_name.clone())
            .or_default()
            .entry(self.name.clone())
            .or_default();
        f(data)
    }
}

impl fmt::Display for MemoryCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collection({}, '{}')", self.database, self.name)
    }
}

impl fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("full_name", &self.full_name())
            .finish()
    }
}

impl Handle for MemoryCollection {
    fn surface(&self) -> &'static SurfaceDescriptor {
        &COLLECTION_SURFACE
    }

    /// An empty collection evaluates false
    fn truthy(&self) -> bool {
        self.read(|data| data.is_some_and(|data| !data.documents.is_empty()))
    }
}

impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_name(&self) -> String {
        format!("{}.{}", self.database_name, self.name)
    }

    fn find(&self, filter: &Document) -> Result<Vec<Document>> {
        self.shared.enter("find")?;
        Ok(self.read(|data| {
            data.map(|data| {
                data.documents
                    .iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
        }))
    }

    fn find_one(&self, filter: &Document) -> Result<Option<Document>> {
        self.shared.enter("find_one")?;
        Ok(self.read(|data| {
            data.and_then(|data| {
                data.documents
                    .iter()
                    .find(|doc| matches_filter(doc, filter))
                    .cloned()
            })
        }))
    }

    fn insert(&self, document: Document) -> Result<Value> {
        self.shared.enter("insert")?;
        let Value::Object(mut fields) = document else {
            return Err(DriverError::OperationFailure(
                "documents must be objects".to_string(),
            ));
        };

        self.write(|data| {
            let id = match fields.get("_id") {
                Some(id) => id.clone(),
                None => {
                    data.next_id += 1;
                    let id = json!(data.next_id);
                    fields.insert("_id".to_string(), id.clone());
                    id
                }
            };
            if data.documents.iter().any(|doc| doc.get("_id") == Some(&id)) {
                return Err(DriverError::DuplicateKey(format!(
                    "{} _id: {}",
                    self.full_name(),
                    id
                )));
            }
            data.documents.push(Value::Object(fields));
            Ok(id)
        })
    }

    fn update(&self, filter: &Document, update: &Document, upsert: bool) -> Result<u64> {
        self.shared.enter("update")?;
        let changes = update_fields(update)?;

        self.write(|data| {
            let mut modified = 0;
            for doc in data
                .documents
                .iter_mut()
                .filter(|doc| matches_filter(doc, filter))
            {
                if let Value::Object(fields) = doc {
                    for (key, value) in changes {
                        fields.insert(key.clone(), value.clone());
                    }
                    modified += 1;
                }
            }

            if modified == 0 && upsert {
                let mut fields = filter.as_object().cloned().unwrap_or_default();
                fields.extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
                if !fields.contains_key("_id") {
                    data.next_id += 1;
                    fields.insert("_id".to_string(), json!(data.next_id));
                }
                data.documents.push(Value::Object(fields));
                modified = 1;
            }
            Ok(modified)
        })
    }

    fn remove(&self, filter: &Document) -> Result<u64> {
        self.shared.enter("remove")?;
        Ok(self.write(|data| {
            let before = data.documents.len();
            data.documents.retain(|doc| !matches_filter(doc, filter));
            (before - data.documents.len()) as u64
        }))
    }

    fn count(&self) -> Result<u64> {
        self.shared.enter("count")?;
        Ok(self.read(|data| data.map_or(0, |data| data.documents.len() as u64)))
    }

    fn distinct(&self, key: &str) -> Result<Vec<Value>> {
        self.shared.enter("distinct")?;
        Ok(self.read(|data| {
            let mut values: Vec<Value> = Vec::new();
            for value in data
                .into_iter()
                .flat_map(|data| data.documents.iter())
                .filter_map(|doc| doc.get(key))
            {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
            values
        }))
    }

    fn ensure_index(&self, key: &str) -> Result<String> {
        self.shared.enter("ensure_index")?;
        let index = format!("{}_{}", key, driver::ASCENDING);
        self.write(|data| {
            if !data.indexes.contains(&index) {
                data.indexes.push(index.clone());
            }
        });
        Ok(index)
    }

    fn index_information(&self) -> Result<Vec<String>> {
        self.shared.enter("index_information")?;
        Ok(self.read(|data| {
            std::iter::once("_id_".to_string())
                .chain(data.into_iter().flat_map(|data| data.indexes.iter().cloned()))
                .collect()
        }))
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['$', '\0']) || name.starts_with('.') {
        return Err(DriverError::InvalidName(format!("invalid name: {:?}", name)));
    }
    Ok(())
}

/// A document matches when every filter field is present and equal
fn matches_filter(document: &Document, filter: &Document) -> bool {
    match filter.as_object() {
        Some(fields) => fields
            .iter()
            .all(|(key, expected)| document.get(key) == Some(expected)),
        None => true,
    }
}

/// Fields to write for an update: either `{"$set": {...}}` or a plain object
fn update_fields(update: &Document) -> Result<&Map<String, Value>> {
    let fields = update.get("$set").unwrap_or(update);
    fields.as_object().ok_or_else(|| {
        DriverError::OperationFailure(format!("invalid update document: {}", update))
    })
}
