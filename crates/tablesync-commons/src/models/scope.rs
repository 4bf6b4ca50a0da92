//! Principal scopes.
//!
//! A caller participates in a set of scopes: the shared default scope, the
//! scope of their own identity, and one scope per group membership. ACL
//! entries and row filters are expressed against scopes, never against raw
//! authentication state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of principal a scope refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScopeType {
    /// Everyone, including anonymous callers.
    Default,
    /// A single user.
    User,
    /// A named group.
    Group,
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeType::Default => write!(f, "DEFAULT"),
            ScopeType::User => write!(f, "USER"),
            ScopeType::Group => write!(f, "GROUP"),
        }
    }
}

/// An access-control scope: a scope type plus, for user and group scopes,
/// the identifier of the user or group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub value: Option<String>,
}

impl Scope {
    /// The shared default scope every caller holds.
    pub fn default_scope() -> Self {
        Self { scope_type: ScopeType::Default, value: None }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self { scope_type: ScopeType::User, value: Some(user_id.into()) }
    }

    pub fn group(group: impl Into<String>) -> Self {
        Self { scope_type: ScopeType::Group, value: Some(group.into()) }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}:{}", self.scope_type, v),
            None => write!(f, "{}", self.scope_type),
        }
    }
}
