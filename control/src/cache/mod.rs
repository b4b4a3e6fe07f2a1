//! Routing cache
//!
//! ```text
//! watch boundary ──WatchMessage──▶ processor ──apply──▶ RouteCache
//!                                      │                    │
//!                                  SyncFlag ◀── barrier     └── matchers
//! ```
//!
//! - `store` / `table`: the two maps, never exposed outside `RouteCache`
//! - `route_cache`: single-mutex container applying events atomically
//! - `processor`: the only writer, fed by an mpsc channel
//! - `sync`: bounded startup barrier
//! - `matcher`: exact / prefix / regex / pathType-aware lookups
//! - `pattern`: bounded cache of compiled regex lookup patterns

pub mod event;
pub mod matcher;
pub mod pattern;
pub mod processor;
pub mod route_cache;
pub mod store;
pub mod sync;
pub mod table;

pub use event::{IngressEvent, WatchMessage};
pub use matcher::RouteMatch;
pub use pattern::PatternCache;
pub use route_cache::{CacheSnapshot, RouteCache};
pub use sync::{await_initial_sync, SyncFlag, SyncOutcome, SyncSignal};
pub use table::RouteEntry;
