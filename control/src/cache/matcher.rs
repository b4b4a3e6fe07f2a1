//! Route matchers
//!
//! Stateless scans over a host's `RouteEntry`. All of them walk the path
//! rules in declaration order and return the first hit; there is no
//! longest-prefix selection.

use crate::cache::table::RouteEntry;
use common::PathRule;
use regex::Regex;

/// A resolved route: owning Ingress and the backend to send traffic to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub namespace: String,
    pub name: String,
    /// `service.namespace.svc:port`
    pub backend_address: String,
}

impl RouteMatch {
    fn new(entry: &RouteEntry, rule: &PathRule) -> Self {
        Self {
            namespace: entry.namespace().to_string(),
            name: entry.name().to_string(),
            backend_address: rule.backend_address(entry.namespace()),
        }
    }
}

fn first_match<F>(entry: &RouteEntry, predicate: F) -> Option<RouteMatch>
where
    F: Fn(&PathRule) -> bool,
{
    entry
        .paths
        .iter()
        .find(|rule| predicate(rule))
        .map(|rule| RouteMatch::new(entry, rule))
}

/// First rule whose path equals `path`
pub fn exact_match(entry: &RouteEntry, path: &str) -> Option<RouteMatch> {
    first_match(entry, |rule| rule.path == path)
}

/// First rule whose path is a byte-wise prefix of `path`
pub fn prefix_match(entry: &RouteEntry, path: &str) -> Option<RouteMatch> {
    first_match(entry, |rule| common::has_byte_prefix(path, &rule.path))
}

/// First rule of the entry, provided `pattern` matches `path`
///
/// The pattern comes from the caller and is not stored per rule, so it is
/// evaluated once rather than per rule.
pub fn regex_match(entry: &RouteEntry, path: &str, pattern: &Regex) -> Option<RouteMatch> {
    if !pattern.is_match(path) {
        return None;
    }
    first_match(entry, |_| true)
}

/// First rule matching `path` under its own declared `pathType`
pub fn resolve(entry: &RouteEntry, path: &str) -> Option<RouteMatch> {
    first_match(entry, |rule| rule.matches(path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::{IngressKey, PathMatchKind, ServicePort};

    fn entry(paths: &[(&str, PathMatchKind, &str)]) -> RouteEntry {
        RouteEntry {
            owner: IngressKey::new("shop", "web"),
            paths: paths
                .iter()
                .map(|(path, kind, service)| {
                    PathRule::new(*path, *kind, *service, ServicePort::Number(8080))
                })
                .collect(),
        }
    }

    #[test]
    fn test_prefix_first_declared_wins() {
        let entry = entry(&[
            ("/a", PathMatchKind::Prefix, "a"),
            ("/", PathMatchKind::Prefix, "root"),
        ]);

        let found = prefix_match(&entry, "/ab").expect("Should match /a");
        assert_eq!(found.backend_address, "a.shop.svc:8080");
        assert_eq!(found.namespace, "shop");
        assert_eq!(found.name, "web");
    }

    #[test]
    fn test_prefix_is_not_longest_match() {
        let entry = entry(&[
            ("/", PathMatchKind::Prefix, "root"),
            ("/api", PathMatchKind::Prefix, "api"),
        ]);

        let found = prefix_match(&entry, "/api/users").unwrap();
        assert_eq!(found.backend_address, "root.shop.svc:8080");
    }

    #[test]
    fn test_exact_vs_prefix() {
        let entry = entry(&[("/orders", PathMatchKind::Prefix, "orders")]);

        assert!(exact_match(&entry, "/orders/1").is_none());
        assert!(prefix_match(&entry, "/orders/1").is_some());
        assert_eq!(
            exact_match(&entry, "/orders").unwrap().backend_address,
            "orders.shop.svc:8080"
        );
    }

    #[test]
    fn test_no_rule_matches() {
        let entry = entry(&[("/orders", PathMatchKind::Prefix, "orders")]);

        assert!(prefix_match(&entry, "/cart").is_none());
        assert!(exact_match(&entry, "/").is_none());
    }

    #[test]
    fn test_regex_match_returns_first_rule() {
        let entry = entry(&[
            ("/static", PathMatchKind::Prefix, "static"),
            ("/", PathMatchKind::Prefix, "root"),
        ]);
        let pattern = Regex::new(r"^/users/\d+$").unwrap();

        let found = regex_match(&entry, "/users/42", &pattern).unwrap();
        assert_eq!(found.backend_address, "static.shop.svc:8080");

        assert!(regex_match(&entry, "/users/abc", &pattern).is_none());
    }

    #[test]
    fn test_regex_match_empty_entry() {
        let entry = entry(&[]);
        let pattern = Regex::new(".*").unwrap();

        assert!(regex_match(&entry, "/anything", &pattern).is_none());
    }

    #[test]
    fn test_resolve_honors_path_type() {
        let entry = entry(&[
            ("/login", PathMatchKind::Exact, "auth"),
            ("/api", PathMatchKind::Prefix, "api"),
            ("/", PathMatchKind::Prefix, "root"),
        ]);

        assert_eq!(
            resolve(&entry, "/login").unwrap().backend_address,
            "auth.shop.svc:8080"
        );
        // Exact rule skipped, falls through to the catch-all
        assert_eq!(
            resolve(&entry, "/login/reset").unwrap().backend_address,
            "root.shop.svc:8080"
        );
        // Element-wise prefix: /apix is not under /api
        assert_eq!(
            resolve(&entry, "/apix").unwrap().backend_address,
            "root.shop.svc:8080"
        );
        assert_eq!(
            resolve(&entry, "/api/v1").unwrap().backend_address,
            "api.shop.svc:8080"
        );
    }

    #[test]
    fn test_named_port_in_backend_address() {
        let entry = RouteEntry {
            owner: IngressKey::new("prod", "web"),
            paths: vec![PathRule::new(
                "/",
                PathMatchKind::Prefix,
                "frontend",
                ServicePort::Name("http".to_string()),
            )],
        };

        assert_eq!(
            prefix_match(&entry, "/").unwrap().backend_address,
            "frontend.prod.svc:http"
        );
    }
}
