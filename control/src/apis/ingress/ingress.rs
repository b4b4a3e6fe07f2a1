//! Ingress parsing
//!
//! Translates `networking.k8s.io/v1` Ingress objects into `IngressRecord`s.
//! This is the only place the Kubernetes shape is inspected; everything
//! downstream works on the typed record.

use crate::error::IngressParseError;
use common::{
    HostRule, IngressKey, IngressRecord, PathMatchKind, PathRule, ServicePort, DEFAULT_NAMESPACE,
};
use k8s_openapi::api::networking::v1::{HTTPIngressPath, Ingress, ServiceBackendPort};
use kube::ResourceExt;

/// Path used when a rule omits `path` (only legal for ImplementationSpecific)
const DEFAULT_PATH: &str = "/";

/// Identity of an Ingress object, if it has a name
pub fn ingress_key(ingress: &Ingress) -> Option<IngressKey> {
    let name = ingress.metadata.name.as_ref()?;
    let namespace = ingress
        .namespace()
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    Some(IngressKey::new(namespace, name.clone()))
}

/// Parse an Ingress into a record
///
/// Rules without an `http` block contribute nothing. A missing `host` is the
/// catch-all host `""`.
pub fn parse_ingress(ingress: &Ingress) -> Result<IngressRecord, IngressParseError> {
    let key = ingress_key(ingress).ok_or(IngressParseError::MissingName)?;

    let mut rules = Vec::new();
    let spec_rules = ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .map(|rules| rules.as_slice())
        .unwrap_or_default();

    for rule in spec_rules {
        let Some(http) = &rule.http else {
            continue;
        };

        let paths = http
            .paths
            .iter()
            .map(|path| parse_path(&key, path))
            .collect::<Result<Vec<_>, _>>()?;

        rules.push(HostRule {
            host: rule.host.clone().unwrap_or_default(),
            paths,
        });
    }

    Ok(IngressRecord::new(key, rules))
}

fn parse_path(key: &IngressKey, path: &HTTPIngressPath) -> Result<PathRule, IngressParseError> {
    let declared = path.path.as_deref().unwrap_or(DEFAULT_PATH);

    let kind = PathMatchKind::from_path_type(&path.path_type).ok_or_else(|| {
        IngressParseError::UnknownPathType {
            ingress: key.to_string(),
            path_type: path.path_type.clone(),
        }
    })?;

    let service = path.backend.service.as_ref().ok_or_else(|| {
        IngressParseError::MissingServiceBackend {
            ingress: key.to_string(),
            path: declared.to_string(),
        }
    })?;

    let port = service
        .port
        .as_ref()
        .and_then(parse_port)
        .ok_or_else(|| IngressParseError::MissingServicePort {
            ingress: key.to_string(),
            service: service.name.clone(),
        })?;

    Ok(PathRule::new(declared, kind, service.name.clone(), port))
}

fn parse_port(port: &ServiceBackendPort) -> Option<ServicePort> {
    if let Some(number) = port.number {
        return Some(ServicePort::Number(number));
    }
    port.name
        .as_ref()
        .filter(|name| !name.is_empty())
        .map(|name| ServicePort::Name(name.clone()))
}
