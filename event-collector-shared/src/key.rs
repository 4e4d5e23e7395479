//! Resource key type used as the dedup/queue unit.

use std::fmt;

use thiserror::Error;

/// Error returned when a `namespace/name` string cannot be split.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid resource key: {0}")]
pub struct KeyParseError(pub String);

/// Composite identifier `(namespace, name)` of an event resource.
///
/// This addresses the event object itself, not the object the event is
/// about. One key corresponds to at most one queue entry at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    /// Create a key from namespace and name parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a `namespace/name` string into a key.
    ///
    /// Both parts must be non-empty; events are always namespaced.
    pub fn parse(key: &str) -> Result<Self, KeyParseError> {
        match key.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                Ok(Self::new(namespace, name))
            }
            _ => Err(KeyParseError(key.to_string())),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let key = ResourceKey::parse("argocd/argocd-server-abc.17c56a0c").unwrap();
        assert_eq!(key.namespace, "argocd");
        assert_eq!(key.name, "argocd-server-abc.17c56a0c");
        assert_eq!(key.to_string(), "argocd/argocd-server-abc.17c56a0c");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ResourceKey::parse("no-slash").is_err());
        assert!(ResourceKey::parse("/name-only").is_err());
        assert!(ResourceKey::parse("namespace-only/").is_err());
        assert!(ResourceKey::parse("").is_err());
    }

    #[test]
    fn test_keys_with_same_parts_are_equal() {
        let a = ResourceKey::new("default", "e1");
        let b = ResourceKey::parse("default/e1").unwrap();
        assert_eq!(a, b);
    }
}
