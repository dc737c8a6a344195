//! Namespaced asset identifiers.

use std::fmt;
use std::str::FromStr;

/// Identifier of one logical asset: a namespace plus a path inside it.
///
/// Two identifiers are equal only when both parts match exactly. The same
/// identifier may be supplied by several overlays; the cache keeps one
/// document per identifier.
///
/// # Example
///
/// ```
/// use rigcache::AssetId;
///
/// let id = AssetId::new("x", "animations/walk.json");
/// assert_eq!(id.to_string(), "x:animations/walk.json");
/// assert_eq!("x:animations/walk.json".parse::<AssetId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    namespace: String,
    path: String,
}

impl AssetId {
    /// Create an identifier from its two parts.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// The namespace (the `<namespace>` in `assets/<namespace>/...`).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path inside the namespace.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Error returned when a string is not of the form `namespace:path`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset identifier '{0}': expected 'namespace:path'")]
pub struct InvalidAssetId(pub String);

impl FromStr for AssetId {
    type Err = InvalidAssetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s
            .split_once(':')
            .ok_or_else(|| InvalidAssetId(s.to_string()))?;

        if namespace.is_empty() || path.is_empty() {
            return Err(InvalidAssetId(s.to_string()));
        }

        Ok(Self::new(namespace, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_accessors() {
        let id = AssetId::new("x", "geo/model/foo.json");
        assert_eq!(id.namespace(), "x");
        assert_eq!(id.path(), "geo/model/foo.json");
    }

    #[test]
    fn test_equality_is_exact() {
        let a = AssetId::new("x", "animations/a.json");
        let b = AssetId::new("x", "animations/A.json");
        let c = AssetId::new("y", "animations/a.json");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, AssetId::new("x", "animations/a.json"));

        let set: HashSet<_> = [a.clone(), b, c, a].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_ordering_is_namespace_then_path() {
        let mut ids = vec![
            AssetId::new("b", "a"),
            AssetId::new("a", "z"),
            AssetId::new("a", "b"),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                AssetId::new("a", "b"),
                AssetId::new("a", "z"),
                AssetId::new("b", "a"),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("no_separator".parse::<AssetId>().is_err());
        assert!(":path".parse::<AssetId>().is_err());
        assert!("ns:".parse::<AssetId>().is_err());
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let id: AssetId = "x:a:b".parse().unwrap();
        assert_eq!(id.namespace(), "x");
        assert_eq!(id.path(), "a:b");
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(ns in "[a-z0-9_.-]{1,12}", path in "[a-z0-9_./-]{1,40}") {
            let id = AssetId::new(ns, path);
            let parsed: AssetId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}
