//! Caching subsystem.
//!
//! Three layers, leaf first:
//!
//! - [`CacheKey`]: order-independent key derived from a
//!   [`GenerationRequest`](crate::GenerationRequest). See [`key`] for the
//!   canonical form and the accepted collision behaviour.
//!
//! - [`SessionStore`]: string key/value storage scoped to one session.
//!   [`MemoryStore`] is the default: a bounded LRU (moka) with an optional
//!   per-value quota.
//!
//! - [`ResultCache`]: TTL policy, lazy eviction and corruption recovery
//!   on top of a store. The only place caching policy lives; the generator
//!   talks to nothing else.

pub mod key;
pub mod result;
pub mod store;

pub use key::{CACHE_KEY_PREFIX, CacheKey};
pub use result::{CacheConfig, CacheEntry, DEFAULT_TTL, ResultCache};
pub use store::{MemoryStore, SessionStore};
