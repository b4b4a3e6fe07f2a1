//! Compiled pattern cache for regex lookups
//!
//! Callers pass patterns as strings on every lookup. Compiling is far more
//! expensive than the scan itself, so compiled patterns are kept in a
//! bounded map shared by every clone of the controller.

use crate::cache::route_cache::safe_lock;
use crate::error::ControlError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Most patterns kept before the cache is flushed
pub const PATTERN_CACHE_CAPACITY: usize = 128;

/// Bounded cache of compiled caller patterns
///
/// Invalid patterns are never cached. When full, the map is cleared rather
/// than tracking recency; callers normally reuse a handful of patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternCache {
    compiled: Arc<Mutex<HashMap<String, Regex>>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled form of `pattern`, compiling it on first use
    pub fn compile(&self, pattern: &str) -> Result<Regex, ControlError> {
        if let Some(regex) = safe_lock(&self.compiled).get(pattern) {
            return Ok(regex.clone());
        }

        // Compile outside the lock
        let regex = Regex::new(pattern)?;

        let mut compiled = safe_lock(&self.compiled);
        if compiled.len() >= PATTERN_CACHE_CAPACITY {
            debug!("Pattern cache full ({} entries), flushing", compiled.len());
            compiled.clear();
        }
        compiled.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        safe_lock(&self.compiled).len()
    }

    pub fn is_empty(&self) -> bool {
        safe_lock(&self.compiled).is_empty()
    }
}
