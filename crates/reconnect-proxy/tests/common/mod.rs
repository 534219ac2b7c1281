//! Shared fixtures for the proxy integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reconnect_core::{DriverError, FaultPlan, MemoryConnection};
use reconnect_proxy::{ProxyBuilder, ReconnectProxy};
use reconnect_proxy::retry::{RecordingSleeper, RetryPolicy};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

/// An event recorded by [`CaptureLayer`]
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

/// Layer that keeps every event it sees
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn warnings(&self) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.level == Level::WARN)
            .collect()
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Run `f` with a subscriber that captures events on this thread
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, CaptureLayer) {
    let layer = CaptureLayer::default();
    let subscriber = Registry::default().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer)
}

/// A proxied in-memory connection with its fault plan and recorded delays
pub struct Fixture {
    pub proxy: ReconnectProxy<MemoryConnection>,
    pub plan: Arc<FaultPlan>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Fixture {
    pub fn new() -> Self {
        let conn = MemoryConnection::open("mongodb://db.internal:27017/app")
            .expect("test URI should parse");
        let plan = conn.fault_plan().clone();
        let sleeper = RecordingSleeper::new();
        let proxy = ProxyBuilder::new()
            .policy(RetryPolicy::default().with_sleeper(sleeper.clone()))
            .build(Arc::new(conn));
        Self {
            proxy,
            plan,
            sleeper,
        }
    }
}

pub fn failover() -> DriverError {
    DriverError::AutoReconnect("db.internal:27017: not master".to_string())
}

pub fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}
