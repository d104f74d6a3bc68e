//! Static registry of the permission groups spotcli can request.
//!
//! Users pick permissions by human-readable name ("modify library"); each group
//! expands into one or more provider scope strings on the authorization URL.
//! The `default` group is always requested and never shown in the selection menu.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of one permission group in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeGroup {
    pub id: &'static str,
    pub name: &'static str,
    pub scopes: &'static [&'static str],
}

impl ScopeGroup {
    pub fn scope_id(&self) -> ScopeId {
        ScopeId::new(self.id)
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_SCOPE
    }
}

pub const DEFAULT_SCOPE: &str = "default";

pub static SCOPE_REGISTRY: &[ScopeGroup] = &[
    ScopeGroup {
        id: DEFAULT_SCOPE,
        name: "default",
        scopes: &[
            "user-read-playback-state",
            "user-read-currently-playing",
            "user-read-private",
        ],
    },
    ScopeGroup {
        id: "modify-playback",
        name: "modify playback",
        scopes: &["user-modify-playback-state"],
    },
    ScopeGroup {
        id: "user-read",
        name: "read library",
        scopes: &[
            "user-library-read",
            "user-follow-read",
            "user-top-read",
            "user-read-recently-played",
            "playlist-read-private",
            "playlist-read-collaborative",
        ],
    },
    ScopeGroup {
        id: "user-modify",
        name: "modify library",
        scopes: &[
            "user-library-modify",
            "user-follow-modify",
            "playlist-modify-public",
            "playlist-modify-private",
        ],
    },
];

pub fn default_group() -> &'static ScopeGroup {
    &SCOPE_REGISTRY[0]
}

pub fn by_id(id: &ScopeId) -> Option<&'static ScopeGroup> {
    SCOPE_REGISTRY.iter().find(|g| g.id == id.as_str())
}

pub fn by_name(name: &str) -> Option<&'static ScopeGroup> {
    SCOPE_REGISTRY.iter().find(|g| g.name == name)
}

/// Groups offered in the interactive selection menu.
pub fn selectable() -> impl Iterator<Item = &'static ScopeGroup> {
    SCOPE_REGISTRY.iter().filter(|g| !g.is_default())
}

/// Resolves human-readable names, failing on the first unknown one.
pub fn resolve_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<&'static ScopeGroup>> {
    names
        .iter()
        .map(|name| {
            by_name(name.as_ref()).ok_or_else(|| {
                Error::InvalidInput(format!("unknown permission `{}`", name.as_ref()))
            })
        })
        .collect()
}

/// Expands groups into provider scope strings.
///
/// The default group always comes first. Order is otherwise preserved and
/// duplicates are dropped.
pub fn provider_scopes(groups: &[&ScopeGroup]) -> Vec<&'static str> {
    let mut scopes: Vec<&'static str> = Vec::new();
    let mut all: Vec<&ScopeGroup> = vec![default_group()];
    all.extend_from_slice(groups);
    for group in all {
        for scope in group.scopes {
            if !scopes.contains(scope) {
                scopes.push(scope);
            }
        }
    }
    scopes
}
