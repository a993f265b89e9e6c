//! Single-flight cell holding the outcome of one producer run.
//!
//! A [`CacheCell<T>`] is written at most once. The first caller to reach it
//! runs the producer; everyone else, concurrent or late, waits for that run to
//! be published and then borrows the same value. Reading a published cell is
//! one atomic load.

use core::cell::UnsafeCell;
use core::fmt;
#[cfg(feature = "async-tokio")]
use core::future::Future;

use crate::state::Gate;

/// A write-once slot guarded by a one-shot execution gate.
///
/// [`CallCache`](crate::CallCache) hands these out per key with `T` set to the
/// producer's `Result<V, E>`, which is what makes failures as sticky as
/// successes: the cell does not care which variant it stored.
pub struct CacheCell<T> {
   gate: Gate,
   // Written once by the holder of the gate's `Run`, read only after the gate
   // reports done.
   outcome: UnsafeCell<Option<T>>,
}

// SAFETY: the only write to `outcome` happens-before the gate turns done, and
// readers only touch it afterwards, so shared access needs `T: Sync`. The
// outcome can be produced on one thread and dropped on another, hence `T: Send`.
unsafe impl<T: Send + Sync> Sync for CacheCell<T> {}
// SAFETY: moving the cell moves the outcome with it.
unsafe impl<T: Send> Send for CacheCell<T> {}

impl<T> CacheCell<T> {
   /// Creates an empty cell whose producer has not run.
   #[must_use]
   pub fn new() -> Self {
      Self {
         gate: Gate::new(),
         outcome: UnsafeCell::new(None),
      }
   }

   /// Returns `true` once the producer has run to completion.
   ///
   /// Never blocks.
   #[inline]
   pub fn is_executed(&self) -> bool {
      self.gate.is_done()
   }

   /// Returns the stored outcome, or `None` while the producer has not
   /// finished. Never blocks.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if !self.gate.is_done() {
         return None;
      }
      // SAFETY: the gate is done, so nobody writes `outcome` any more.
      unsafe { (*self.outcome.get()).as_ref() }
   }

   /// Runs `f` if no caller has run it yet and returns the stored outcome.
   ///
   /// Concurrent callers block until the single run completes. If `f` panics
   /// the cell stays empty and the next caller gets to run its own producer.
   ///
   /// Calling `execute_once` on the same cell from inside `f` deadlocks.
   pub fn execute_once<F>(&self, f: F) -> &T
   where
      F: FnOnce() -> T,
   {
      if let Some(run) = self.gate.claim_blocking() {
         let value = f();
         self.store(value);
         run.publish();
      }
      self.published()
   }

   /// Async flavour of [`CacheCell::execute_once`].
   ///
   /// Waiting tasks yield to the runtime instead of blocking their thread.
   /// Dropping the future while it is running `f` reopens the cell.
   #[cfg(feature = "async-tokio")]
   pub async fn execute_once_async<F, Fut>(&self, f: F) -> &T
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = T>,
   {
      if let Some(run) = self.gate.claim_async().await {
         let value = f().await;
         self.store(value);
         run.publish();
      }
      self.published()
   }

   /// Must only be called while holding the gate's `Run`.
   fn store(&self, value: T) {
      // SAFETY: the `Run` makes this the only live access to `outcome`.
      unsafe { *self.outcome.get() = Some(value) };
   }

   fn published(&self) -> &T {
      match self.get() {
         Some(value) => value,
         None => unreachable!("gate reported done without a stored outcome"),
      }
   }
}

impl<T> Default for CacheCell<T> {
   fn default() -> Self {
      Self::new()
   }
}

impl<T: fmt::Debug> fmt::Debug for CacheCell<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.get() {
         Some(value) => f.debug_tuple("CacheCell").field(value).finish(),
         None => f.write_str("CacheCell(<pending>)"),
      }
   }
}
