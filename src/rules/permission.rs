use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Closed vocabulary of `GITHUB_TOKEN` permission scopes.
///
/// Rule tables can only name scopes from this list; anything else fails
/// to deserialize rather than inventing a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionScope {
    Actions,
    Checks,
    Contents,
    Deployments,
    Discussions,
    Issues,
    Packages,
    Pages,
    PullRequests,
    RepositoryProjects,
    SecurityEvents,
    Statuses,
}

impl PermissionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Checks => "checks",
            Self::Contents => "contents",
            Self::Deployments => "deployments",
            Self::Discussions => "discussions",
            Self::Issues => "issues",
            Self::Packages => "packages",
            Self::Pages => "pages",
            Self::PullRequests => "pull-requests",
            Self::RepositoryProjects => "repository-projects",
            Self::SecurityEvents => "security-events",
            Self::Statuses => "statuses",
        }
    }
}

impl std::fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access level of a scope. Ordering is significant: `Write > Read > None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    None,
    Read,
    Write,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn access(self) -> AccessLevel {
        match self {
            Self::Get | Self::Head => AccessLevel::Read,
            Self::Post | Self::Put | Self::Patch | Self::Delete => AccessLevel::Write,
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Head => write!(f, "HEAD"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One scope of a [`PermissionRecord`] with the endpoints that justify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub level: AccessLevel,
    pub endpoints: BTreeSet<String>,
}

/// Scope → access level, keyed only by [`PermissionScope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionRecord {
    entries: BTreeMap<PermissionScope, PermissionEntry>,
}

impl PermissionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `level` for `scope`, keeping the highest level seen so far.
    pub fn grant(&mut self, scope: PermissionScope, level: AccessLevel, endpoint: impl Into<String>) {
        let entry = self.entries.entry(scope).or_insert_with(|| PermissionEntry {
            level,
            endpoints: BTreeSet::new(),
        });
        entry.level = entry.level.max(level);
        entry.endpoints.insert(endpoint.into());
    }

    pub fn get(&self, scope: PermissionScope) -> Option<AccessLevel> {
        self.entries.get(&scope).map(|e| e.level)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PermissionScope, &PermissionEntry)> {
        self.entries.iter().map(|(scope, entry)| (*scope, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_dominates_read() {
        let mut record = PermissionRecord::new();
        record.grant(PermissionScope::Issues, AccessLevel::Read, "GET /issues");
        record.grant(PermissionScope::Issues, AccessLevel::Write, "POST /issues");
        record.grant(PermissionScope::Issues, AccessLevel::Read, "GET /issues/1");
        assert_eq!(record.get(PermissionScope::Issues), Some(AccessLevel::Write));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn scope_serializes_kebab_case() {
        let json = serde_json::to_string(&PermissionScope::PullRequests).unwrap();
        assert_eq!(json, "\"pull-requests\"");
        assert_eq!(PermissionScope::SecurityEvents.to_string(), "security-events");
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let parsed: Result<PermissionScope, _> = serde_json::from_str("\"metadata\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn verb_access_levels() {
        assert_eq!(HttpVerb::Get.access(), AccessLevel::Read);
        assert_eq!(HttpVerb::Delete.access(), AccessLevel::Write);
        assert_eq!(HttpVerb::from_str_lenient("patch"), Some(HttpVerb::Patch));
        assert_eq!(HttpVerb::from_str_lenient("TRACE"), None);
    }
}
