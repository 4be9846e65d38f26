//! Caching layer for API responses
//!
//! This module provides an in-memory TTL cache that both API clients build
//! on. Values are memoized under composite request signatures, expire lazily
//! after a fixed TTL, and failed fetches are never stored so they stay
//! retryable.

mod memory;

pub use memory::TtlCache;
