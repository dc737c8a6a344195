//! Shared expression-variable registry.
//!
//! Keyframe values may be expressions such as `math.sin(query.anim_time * 90)`.
//! Evaluating them is left to the host; the registry only records which
//! `query.*` variables exist and their current values, so that parsers can
//! flag references to variables nobody provides.

use std::sync::OnceLock;

use dashmap::DashMap;
use regex::Regex;

/// Query variables registered on every new cache.
pub const STANDARD_QUERIES: &[&str] = &[
    "query.actor_count",
    "query.anim_time",
    "query.distance_from_camera",
    "query.ground_speed",
    "query.head_x_rotation",
    "query.head_y_rotation",
    "query.health",
    "query.is_in_water",
    "query.is_in_water_or_rain",
    "query.is_on_ground",
    "query.life_time",
    "query.limb_swing",
    "query.limb_swing_amount",
    "query.max_health",
    "query.moon_phase",
    "query.time_of_day",
    "query.time_stamp",
    "query.vertical_speed",
    "query.yaw_speed",
];

/// Thread-safe table of expression variables and their current values.
#[derive(Debug, Default)]
pub struct VariableRegistry {
    values: DashMap<String, f64>,
}

impl VariableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with [`STANDARD_QUERIES`], all set to zero.
    pub fn with_standard_queries() -> Self {
        let registry = Self::new();
        for name in STANDARD_QUERIES {
            registry.register(name);
        }
        registry
    }

    /// Register a variable with value zero. Returns `false` if it already existed.
    pub fn register(&self, name: &str) -> bool {
        let name = canonical_name(name);
        if self.values.contains_key(&name) {
            return false;
        }
        self.values.insert(name, 0.0);
        true
    }

    /// Set a variable's value, registering it if needed.
    pub fn set(&self, name: &str, value: f64) {
        self.values.insert(canonical_name(name), value);
    }

    /// Current value of a variable.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&canonical_name(name)).map(|v| *v)
    }

    /// Check if a variable is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&canonical_name(name))
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no variables are registered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Registered variable names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Query variables referenced by `expression` that are not registered.
    pub fn unknown_references(&self, expression: &str) -> Vec<String> {
        query_references(expression)
            .into_iter()
            .filter(|name| !self.values.contains_key(name))
            .collect()
    }
}

/// Expand the short `q.` prefix to `query.` and lowercase the name.
pub fn canonical_name(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    match name.strip_prefix("q.") {
        Some(rest) => format!("query.{}", rest),
        None => name,
    }
}

/// Pattern matching a `query.<name>` or `q.<name>` reference.
///
/// Group 1 is the member name. The leading group rejects references embedded
/// in longer identifiers such as `myquery.x`.
fn query_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^A-Za-z0-9_.])(?:query|q)\.([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

/// Every `query.*` / `q.*` name referenced in `expression`, canonicalized and
/// in order of first appearance.
pub fn query_references(expression: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for captures in query_pattern().captures_iter(expression) {
        let name = canonical_name(&format!("query.{}", &captures[1]));
        if !found.contains(&name) {
            found.push(name);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_queries_are_seeded() {
        let registry = VariableRegistry::with_standard_queries();
        assert_eq!(registry.len(), STANDARD_QUERIES.len());
        assert!(registry.contains("query.anim_time"));
        assert!(registry.contains("q.anim_time"));
        assert_eq!(registry.get("query.anim_time"), Some(0.0));
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = VariableRegistry::new();
        assert!(registry.register("query.custom"));
        assert!(!registry.register("q.custom"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_registers_and_updates() {
        let registry = VariableRegistry::new();
        registry.set("q.health", 20.0);
        assert_eq!(registry.get("query.health"), Some(20.0));

        registry.set("query.health", 5.0);
        assert_eq!(registry.get("q.health"), Some(5.0));
    }

    #[test]
    fn test_query_references_finds_both_prefixes() {
        let refs = query_references("math.sin(query.anim_time * 90) + q.life_time - Q.Anim_Time");
        assert_eq!(refs, vec!["query.anim_time", "query.life_time"]);
    }

    #[test]
    fn test_query_references_ignores_other_names() {
        assert!(query_references("math.cos(variable.x) * 2").is_empty());
        assert!(query_references("myquery.x + 1").is_empty());
        assert!(query_references("12.5").is_empty());
    }

    #[test]
    fn test_unknown_references() {
        let registry = VariableRegistry::with_standard_queries();
        let unknown = registry.unknown_references("query.anim_time + query.wing_flap");
        assert_eq!(unknown, vec!["query.wing_flap"]);
    }

    #[test]
    fn test_names_sorted() {
        let registry = VariableRegistry::new();
        registry.register("query.b");
        registry.register("query.a");
        assert_eq!(registry.names(), vec!["query.a", "query.b"]);
    }
}
