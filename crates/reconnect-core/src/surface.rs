//! Static descriptions of client member surfaces
//!
//! Every handle type publishes the list of its named members through a
//! [`SurfaceDescriptor`]. The list is a property of the type, not of an
//! instance, which lets a retry layer decide which members are remote
//! operations without touching a live connection.

use std::fmt;

/// Kind of a named member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// An invocable member (a method or free function)
    Method,
    /// A plain attribute, read without invoking anything
    Attribute,
    /// Subscript access yielding a nested handle (e.g. `conn["db"]`)
    Item,
}

/// A named member of a handle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Member {
    name: &'static str,
    kind: MemberKind,
}

impl Member {
    /// Describe an invocable member
    pub const fn method(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Method,
        }
    }

    /// Describe a plain attribute
    pub const fn attribute(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Attribute,
        }
    }

    /// Describe a subscript accessor
    pub const fn item(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Item,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Whether calling this member invokes something
    pub fn is_invocable(&self) -> bool {
        self.kind == MemberKind::Method
    }

    /// Names starting with an underscore are internal to the client library
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// The member surface of one handle type or namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    name: &'static str,
    members: &'static [Member],
}

impl SurfaceDescriptor {
    pub const fn new(name: &'static str, members: &'static [Member]) -> Self {
        Self { name, members }
    }

    /// Type name, e.g. `Collection`
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn members(&self) -> &'static [Member] {
        self.members
    }

    /// Look up a member by name
    pub fn member(&self, name: &str) -> Option<&'static Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether `name` is an invocable member of this surface
    pub fn is_invocable(&self, name: &str) -> bool {
        self.member(name).is_some_and(Member::is_invocable)
    }

    /// Member names in declaration order
    pub fn member_names(&self) -> impl Iterator<Item = &'static str> {
        self.members.iter().map(|m| m.name)
    }
}

impl fmt::Display for SurfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Surface of [`crate::Collection`] handles
pub static COLLECTION_SURFACE: SurfaceDescriptor =
    SurfaceDescriptor::new("Collection", COLLECTION_MEMBERS);

const COLLECTION_MEMBERS: &[Member] = &[
    Member::attribute("name"),
    Member::attribute("full_name"),
    Member::method("find"),
    Member::method("find_one"),
    Member::method("insert"),
    Member::method("update"),
    Member::method("remove"),
    Member::method("count"),
    Member::method("distinct"),
    Member::method("ensure_index"),
    Member::method("index_information"),
];

/// Surface of [`crate::Database`] handles
pub static DATABASE_SURFACE: SurfaceDescriptor =
    SurfaceDescriptor::new("Database", DATABASE_MEMBERS);

const DATABASE_MEMBERS: &[Member] = &[
    Member::attribute("name"),
    Member::item("collection"),
    Member::method("collection_names"),
    Member::method("command"),
    Member::method("drop_collection"),
];

/// Surface of top-level [`crate::Connection`] handles
pub static CONNECTION_SURFACE: SurfaceDescriptor =
    SurfaceDescriptor::new("Connection", CONNECTION_MEMBERS);

const CONNECTION_MEMBERS: &[Member] = &[
    Member::attribute("host"),
    Member::attribute("port"),
    Member::item("database"),
    Member::method("database_names"),
    Member::method("server_info"),
    Member::method("drop_database"),
    Member::method("close"),
];

/// Surface of the [`crate::driver`] namespace
pub static DRIVER_SURFACE: SurfaceDescriptor =
    SurfaceDescriptor::new("driver", DRIVER_MEMBERS);

const DRIVER_MEMBERS: &[Member] = &[
    Member::attribute("ASCENDING"),
    Member::attribute("DESCENDING"),
    Member::attribute("DEFAULT_PORT"),
    Member::method("version"),
    Member::method("parse_uri"),
];
