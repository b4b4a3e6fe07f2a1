//! Typed ingress notifications
//!
//! Produced by the watch boundary once an object has been parsed into an
//! `IngressRecord`, consumed by the event processor.

use common::IngressRecord;
use std::sync::Arc;

/// A change to apply to the routing cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressEvent {
    Add(Arc<IngressRecord>),
    Update {
        old: Arc<IngressRecord>,
        new: Arc<IngressRecord>,
    },
    Delete(Arc<IngressRecord>),
}

impl IngressEvent {
    /// Metric/log label for this event
    pub fn kind(&self) -> &'static str {
        match self {
            IngressEvent::Add(_) => "add",
            IngressEvent::Update { .. } => "update",
            IngressEvent::Delete(_) => "delete",
        }
    }
}

/// Message on the channel between the watch task and the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    Event(IngressEvent),
    /// The watch finished delivering its initial list
    InitialListDelivered,
}
