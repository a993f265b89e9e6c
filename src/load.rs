//! Load-or-compute entry points.

#[cfg(feature = "async-tokio")]
use core::future::Future;

use tracing::{debug, trace};

use crate::context::Context;

/// Returns the outcome of `producer` for `key`, running it at most once per
/// call cache.
///
/// Without a cache on `ctx` the producer is simply called. With one, all
/// callers that share the cache and the key (and the `Result<V, E>` type) get
/// a clone of the first run's outcome, errors included. Callers arriving while
/// that run is in flight block until it finishes.
///
/// The producer receives `ctx` itself and may call `load_or_compute` with other
/// keys. Calling it with its own key deadlocks.
///
/// A producer that panics is not cached: the panic unwinds through this call,
/// the key stays empty, and the next caller for the key runs its own producer.
///
/// # Examples
///
/// ```rust
/// use ctx_cache::{load_or_compute, Context};
///
/// let ctx = Context::background().with_call_cache();
///
/// let first = load_or_compute(&ctx, "answer", |_| Ok::<_, String>(42));
/// let second = load_or_compute(&ctx, "answer", |_| Ok::<_, String>(0));
/// assert_eq!(first, Ok(42));
/// assert_eq!(second, Ok(42));
/// ```
pub fn load_or_compute<V, E, F>(ctx: &Context, key: &str, producer: F) -> Result<V, E>
where
   V: Clone + Send + Sync + 'static,
   E: Clone + Send + Sync + 'static,
   F: FnOnce(&Context) -> Result<V, E>,
{
   let Some(cache) = ctx.call_cache() else {
      trace!(key, "no call cache on context, running producer uncached");
      return producer(ctx);
   };

   let cell = cache.cell::<Result<V, E>>(key);
   cell
      .execute_once(|| {
         debug!(key, "running producer");
         producer(ctx)
      })
      .clone()
}

/// Async flavour of [`load_or_compute`].
///
/// The producer gets an owned clone of `ctx`. If the future driving the
/// producer is dropped before it completes, the key is left empty and the next
/// caller runs its own producer.
#[cfg(feature = "async-tokio")]
pub async fn load_or_compute_async<V, E, F, Fut>(
   ctx: &Context,
   key: &str,
   producer: F,
) -> Result<V, E>
where
   V: Clone + Send + Sync + 'static,
   E: Clone + Send + Sync + 'static,
   F: FnOnce(Context) -> Fut,
   Fut: Future<Output = Result<V, E>>,
{
   let Some(cache) = ctx.call_cache() else {
      trace!(key, "no call cache on context, running producer uncached");
      return producer(ctx.clone()).await;
   };

   let cell = cache.cell::<Result<V, E>>(key);
   cell
      .execute_once_async(|| {
         debug!(key, "running producer");
         producer(ctx.clone())
      })
      .await
      .clone()
}
