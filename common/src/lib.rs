#![no_std]

//! kroute Common Types
//!
//! Core data structures for Ingress routing: record identity, path rules,
//! backend ports and the path matching primitives used by the matchers.
//! Kept free of Kubernetes and runtime dependencies so they can be shared
//! by the control plane, tests and any future data-plane consumer.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Namespace used when an object carries no namespace
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identity of an Ingress record: (namespace, name)
///
/// Displays as `namespace/name`, which is unique across the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngressKey {
    pub namespace: String,
    pub name: String,
}

impl IngressKey {
    #[inline]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for IngressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// How a rule's path is compared against a request path
///
/// Mirrors the Ingress v1 `pathType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathMatchKind {
    /// Case-sensitive equality
    Exact,
    /// Element-wise prefix split on `/`
    Prefix,
    /// Left to the implementation; treated as a byte-wise prefix
    ImplementationSpecific,
}

impl PathMatchKind {
    /// Parse an Ingress `pathType` value
    ///
    /// Returns None for values outside the Ingress v1 enum.
    pub fn from_path_type(path_type: &str) -> Option<Self> {
        match path_type {
            "Exact" => Some(PathMatchKind::Exact),
            "Prefix" => Some(PathMatchKind::Prefix),
            "ImplementationSpecific" => Some(PathMatchKind::ImplementationSpecific),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PathMatchKind::Exact => "Exact",
            PathMatchKind::Prefix => "Prefix",
            PathMatchKind::ImplementationSpecific => "ImplementationSpecific",
        }
    }
}

/// Backend service port, either numeric or a named port on the Service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ServicePort {
    Number(i32),
    Name(String),
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServicePort::Number(number) => write!(f, "{}", number),
            ServicePort::Name(name) => f.write_str(name),
        }
    }
}

/// A single path rule of an Ingress host rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRule {
    /// Declared path (prefix or exact path depending on `kind`)
    pub path: String,
    pub kind: PathMatchKind,
    /// Backend Service name
    pub service: String,
    pub port: ServicePort,
}

impl PathRule {
    pub fn new(
        path: impl Into<String>,
        kind: PathMatchKind,
        service: impl Into<String>,
        port: ServicePort,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            service: service.into(),
            port,
        }
    }

    /// DNS-style backend address for this rule inside `namespace`
    pub fn backend_address(&self, namespace: &str) -> String {
        backend_address(&self.service, namespace, &self.port)
    }

    /// Match `path` according to this rule's declared kind
    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            PathMatchKind::Exact => path == self.path,
            PathMatchKind::Prefix => has_element_prefix(path, &self.path),
            PathMatchKind::ImplementationSpecific => has_byte_prefix(path, &self.path),
        }
    }
}

/// One host rule of an Ingress: a host and its ordered path rules
///
/// The empty host is the catch-all rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostRule {
    pub host: String,
    pub paths: Vec<PathRule>,
}

/// A structurally valid Ingress object
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IngressRecord {
    pub key: IngressKey,
    /// Host rules in declaration order
    pub rules: Vec<HostRule>,
}

impl IngressRecord {
    pub fn new(key: IngressKey, rules: Vec<HostRule>) -> Self {
        Self { key, rules }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.key.namespace
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Distinct hosts declared by this record, in first-declaration order
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if !hosts.contains(&rule.host.as_str()) {
                hosts.push(&rule.host);
            }
        }
        hosts
    }

    pub fn declares_host(&self, host: &str) -> bool {
        self.rules.iter().any(|rule| rule.host == host)
    }

    /// Path rules for `host`, flattened across every rule declaring it
    ///
    /// Only rules for `host` contribute; declaration order is preserved.
    pub fn paths_for_host(&self, host: &str) -> Vec<PathRule> {
        self.rules
            .iter()
            .filter(|rule| rule.host == host)
            .flat_map(|rule| rule.paths.iter().cloned())
            .collect()
    }
}

/// Build a `service.namespace.svc:port` backend address
pub fn backend_address(service: &str, namespace: &str, port: &ServicePort) -> String {
    alloc::format!("{}.{}.svc:{}", service, namespace, port)
}

/// Byte-wise prefix test
#[inline]
pub fn has_byte_prefix(path: &str, prefix: &str) -> bool {
    path.as_bytes().starts_with(prefix.as_bytes())
}

/// Ingress v1 `Prefix` semantics: match on whole path elements
///
/// `/foo` matches `/foo`, `/foo/` and `/foo/bar` but not `/foobar`.
/// A trailing slash on the prefix is ignored, and `/` matches every path.
pub fn has_element_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn record() -> IngressRecord {
        IngressRecord::new(
            IngressKey::new("shop", "web"),
            vec![
                HostRule {
                    host: "a.example.com".to_string(),
                    paths: vec![PathRule::new(
                        "/cart",
                        PathMatchKind::Prefix,
                        "cart",
                        ServicePort::Number(80),
                    )],
                },
                HostRule {
                    host: "b.example.com".to_string(),
                    paths: vec![PathRule::new(
                        "/",
                        PathMatchKind::Prefix,
                        "home",
                        ServicePort::Number(80),
                    )],
                },
                HostRule {
                    host: "a.example.com".to_string(),
                    paths: vec![PathRule::new(
                        "/",
                        PathMatchKind::Prefix,
                        "catalog",
                        ServicePort::Name("http".to_string()),
                    )],
                },
            ],
        )
    }

    #[test]
    fn test_ingress_key_display() {
        assert_eq!(IngressKey::new("default", "web").to_string(), "default/web");
    }

    #[test]
    fn test_hosts_are_distinct_and_ordered() {
        assert_eq!(record().hosts(), vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn test_paths_scoped_to_host() {
        let record = record();

        let a_paths = record.paths_for_host("a.example.com");
        assert_eq!(a_paths.len(), 2);
        assert_eq!(a_paths[0].service, "cart");
        assert_eq!(a_paths[1].service, "catalog");

        let b_paths = record.paths_for_host("b.example.com");
        assert_eq!(b_paths.len(), 1);
        assert_eq!(b_paths[0].service, "home");

        assert!(record.paths_for_host("c.example.com").is_empty());
    }

    #[test]
    fn test_backend_address_numeric_and_named_port() {
        assert_eq!(
            backend_address("orders", "shop", &ServicePort::Number(8080)),
            "orders.shop.svc:8080"
        );
        assert_eq!(
            backend_address("orders", "shop", &ServicePort::Name("grpc".to_string())),
            "orders.shop.svc:grpc"
        );
    }

    #[test]
    fn test_path_type_parsing() {
        assert_eq!(
            PathMatchKind::from_path_type("Exact"),
            Some(PathMatchKind::Exact)
        );
        assert_eq!(
            PathMatchKind::from_path_type("ImplementationSpecific"),
            Some(PathMatchKind::ImplementationSpecific)
        );
        assert_eq!(PathMatchKind::from_path_type("exact"), None);
    }
}
