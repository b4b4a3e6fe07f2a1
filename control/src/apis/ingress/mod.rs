//! Ingress support (networking.k8s.io/v1)
//!
//! - ingress: parsing Ingress objects into typed records
//! - ingress_watcher: watch stream → typed cache events

#[allow(clippy::module_inception)]
pub mod ingress;
pub mod ingress_watcher;
