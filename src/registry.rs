//! Per-context registry of cache cells.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::cell::CacheCell;
use crate::context::Context;

type ErasedCell = Arc<dyn Any + Send + Sync>;

/// Map from key to [`CacheCell`], shared by every context derived from the one
/// it was attached to.
///
/// Cells are bucketed by the type they store, so a key used with two different
/// outcome types yields two independent cells. Within one type a key always
/// resolves to the same cell. Entries are only ever inserted; they are dropped
/// together with the registry.
///
/// A `CallCache` can only be created through [`Context::with_call_cache`].
pub struct CallCache {
   // outcome type -> key -> Arc<CacheCell<outcome>>
   cells: RwLock<HashMap<TypeId, HashMap<Box<str>, ErasedCell>>>,
}

impl CallCache {
   /// `HashMap::new` does not allocate, so the backing storage only
   /// materializes on the first insert.
   pub(crate) fn new() -> Self {
      Self {
         cells: RwLock::new(HashMap::new()),
      }
   }

   /// Returns the cell for `key`, creating an empty one if needed.
   ///
   /// Lookups take the read lock. Only a miss takes the write lock, and it
   /// re-checks before inserting since another caller may have created the
   /// cell in between.
   pub fn cell<T>(&self, key: &str) -> Arc<CacheCell<T>>
   where
      T: Send + Sync + 'static,
   {
      let outcome = TypeId::of::<T>();

      // Fast path: read-lock.
      let found = self
         .cells
         .read()
         .get(&outcome)
         .and_then(|by_key| by_key.get(key))
         .cloned();
      if let Some(cell) = found {
         return downcast(cell);
      }

      // Slow path: write-lock with re-check.
      let mut cells = self.cells.write();
      let by_key = cells.entry(outcome).or_default();
      if let Some(cell) = by_key.get(key) {
         trace!(key, "cell created by a concurrent caller");
         return downcast(Arc::clone(cell));
      }
      let cell = Arc::new(CacheCell::<T>::new());
      by_key.insert(key.into(), Arc::clone(&cell) as ErasedCell);
      trace!(key, "created cache cell");
      cell
   }

   /// Returns `true` if a cell storing `T` exists for `key`, executed or not.
   pub fn contains<T: 'static>(&self, key: &str) -> bool {
      self
         .cells
         .read()
         .get(&TypeId::of::<T>())
         .is_some_and(|by_key| by_key.contains_key(key))
   }

   /// Number of cells across all outcome types.
   pub fn len(&self) -> usize {
      self.cells.read().values().map(HashMap::len).sum()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }
}

fn downcast<T>(cell: ErasedCell) -> Arc<CacheCell<T>>
where
   T: Send + Sync + 'static,
{
   match cell.downcast::<CacheCell<T>>() {
      Ok(cell) => cell,
      Err(_) => unreachable!("cells are bucketed by the TypeId of their outcome"),
   }
}

impl fmt::Debug for CallCache {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("CallCache").field("cells", &self.len()).finish()
   }
}

impl Context {
   /// Returns a context with a [`CallCache`] attached.
   ///
   /// If this context (or one of its ancestors) already carries a cache, a
   /// clone of `self` is returned and the existing cache stays in charge.
   /// Otherwise the result is a child context with a fresh, empty cache.
   #[must_use]
   pub fn with_call_cache(&self) -> Self {
      if self.call_cache().is_some() {
         return self.clone();
      }
      trace!("attaching call cache to context");
      self.with_value(CallCache::new())
   }

   /// The call cache reachable from this context, if one was attached.
   pub fn call_cache(&self) -> Option<&CallCache> {
      self.value::<CallCache>()
   }
}
