//! kroute Control Plane Library
//!
//! In-memory Ingress routing cache: watches Ingress objects, keeps a
//! host → path rules table current, and answers host+path lookups.

pub mod apis;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;

pub use cache::{RouteMatch, SyncOutcome};
pub use config::ControllerConfig;
pub use controller::Controller;
pub use error::{ControlError, IngressParseError};
