//! Classification of client members into retryable operations
//!
//! An operation is a public, invocable member of one of the client's root
//! surfaces. The set depends only on the surface descriptions, so it is
//! computed once and shared by every proxy.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use reconnect_core::{
    COLLECTION_SURFACE, CONNECTION_SURFACE, DRIVER_SURFACE, Member, SurfaceDescriptor,
};

/// Root surfaces the process-wide operation set is classified from:
/// the collection handle, the top-level connection and the driver namespace.
pub static DEFAULT_ROOTS: [&SurfaceDescriptor; 3] =
    [&COLLECTION_SURFACE, &CONNECTION_SURFACE, &DRIVER_SURFACE];

static GLOBAL_OPERATIONS: LazyLock<Arc<OperationSet>> =
    LazyLock::new(|| Arc::new(OperationSet::classify(&DEFAULT_ROOTS)));

/// Names of the members whose calls are retried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSet {
    names: BTreeSet<String>,
}

impl OperationSet {
    /// Union of the public, invocable member names of `roots`.
    ///
    /// # Panics
    ///
    /// Panics if `roots` is empty.
    pub fn classify(roots: &[&SurfaceDescriptor]) -> Self {
        assert!(
            !roots.is_empty(),
            "operation classification needs at least one root surface"
        );

        let names: BTreeSet<String> = roots
            .iter()
            .flat_map(|surface| surface.members())
            .filter(|member| member.is_invocable() && !member.is_private())
            .map(Member::name)
            .map(str::to_string)
            .collect();

        tracing::debug!(
            roots = ?roots.iter().map(|s| s.name()).collect::<Vec<_>>(),
            operations = names.len(),
            "classified client operations"
        );

        Self { names }
    }

    /// Build a set from an explicit list of names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The process-wide set classified from [`DEFAULT_ROOTS`]
    pub fn global() -> Arc<Self> {
        GLOBAL_OPERATIONS.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
