//! Request-scoped memoization with single-flight execution.
//!
//! A [`Context`] carries request-scoped values. Attaching a [`CallCache`] to
//! it with [`Context::with_call_cache`] turns every [`load_or_compute`] call
//! made through that context (or anything derived from it) into a memoized,
//! single-flight call:
//!
//! - the producer for a key runs at most once per cache,
//! - concurrent callers for the same key block until that one run finishes,
//! - every caller sees the same outcome, failures included.
//!
//! Contexts without a cache run the producer directly, so caching is opt-in
//! per request and unrelated requests never share entries.
//!
//! # Features
//!
//! - **Lock-free hits**: a published cell is read with one atomic load.
//! - **Read-mostly registry**: key lookups share a read lock; only the first
//!   caller for a key takes the write lock.
//! - **Futex-based waiting**: blocked threads park via `parking_lot_core`.
//! - **Async support**: [`load_or_compute_async`] behind the default
//!   `async-tokio` feature; waiting tasks sleep on a `tokio::sync::Notify`.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use ctx_cache::{load_or_compute, Context};
//!
//! static LOOKUPS: AtomicUsize = AtomicUsize::new(0);
//!
//! fn user_name(ctx: &Context, id: u64) -> Result<String, String> {
//!    load_or_compute(ctx, &format!("user_name:{id}"), |_| {
//!       LOOKUPS.fetch_add(1, Ordering::Relaxed);
//!       Ok(format!("user-{id}"))
//!    })
//! }
//!
//! let ctx = Context::background().with_call_cache();
//! assert_eq!(user_name(&ctx, 1).as_deref(), Ok("user-1"));
//! assert_eq!(user_name(&ctx, 1).as_deref(), Ok("user-1"));
//! assert_eq!(LOOKUPS.load(Ordering::Relaxed), 1);
//! ```
//!
//! Keys are plain strings chosen by the caller; prefix them with something
//! identifying the call site so unrelated producers never collide.

/// Single-flight result cell.
mod cell;

/// Immutable request context.
mod context;

/// Entry points.
mod load;

/// Per-context key to cell registry.
mod registry;

/// Internal one-shot execution gate.
mod state;

pub use cell::CacheCell;
pub use context::Context;
#[cfg(feature = "async-tokio")]
pub use load::load_or_compute_async;
pub use load::load_or_compute;
pub use registry::CallCache;
