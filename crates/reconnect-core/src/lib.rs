//! Reconnect Core - client abstractions for the auto-reconnect proxy
//!
//! This crate describes the database client the proxy wraps:
//!
//! - `Handle` - reflective behaviour shared by every client handle
//! - `Connection`, `Database`, `Collection` - the handle traits
//! - `SurfaceDescriptor` - static member surface of each handle type
//! - `DriverError` - client errors, including the transient `AutoReconnect`
//! - `memory` - an in-memory client with scripted failures

mod client;
pub mod driver;
mod error;
pub mod memory;
pub mod surface;

pub use client::*;
pub use error::*;
pub use memory::{FaultPlan, MemoryCollection, MemoryConnection, MemoryDatabase};
pub use surface::{
    COLLECTION_SURFACE, CONNECTION_SURFACE, DATABASE_SURFACE, DRIVER_SURFACE, Member, MemberKind,
    SurfaceDescriptor,
};
