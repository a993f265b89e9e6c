//! Request-scoped context values.
//!
//! A [`Context`] is an immutable chain of typed values. Deriving a context with
//! [`Context::with_value`] never touches the parent, so a context can be handed
//! to any number of threads or tasks and each of them can derive its own
//! children. Cloning is a reference-count bump.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

struct Node {
   value: Box<dyn Any + Send + Sync>,
   parent: Option<Arc<Node>>,
}

/// Immutable carrier of request-scoped values.
///
/// # Examples
///
/// ```rust
/// use ctx_cache::Context;
///
/// struct RequestId(u64);
///
/// let root = Context::background();
/// let ctx = root.with_value(RequestId(7));
///
/// assert_eq!(ctx.value::<RequestId>().map(|id| id.0), Some(7));
/// assert!(root.value::<RequestId>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Context {
   head: Option<Arc<Node>>,
}

impl Context {
   /// Returns an empty root context.
   #[inline]
   #[must_use]
   pub const fn background() -> Self {
      Self { head: None }
   }

   /// Derives a child context that additionally carries `value`.
   ///
   /// A value shadows any value of the same type further up the chain.
   #[must_use]
   pub fn with_value<T>(&self, value: T) -> Self
   where
      T: Any + Send + Sync,
   {
      Self {
         head: Some(Arc::new(Node {
            value: Box::new(value),
            parent: self.head.clone(),
         })),
      }
   }

   /// Returns the nearest value of type `T`, if any.
   pub fn value<T: Any>(&self) -> Option<&T> {
      self.nodes().find_map(|node| node.value.downcast_ref::<T>())
   }

   /// Number of values along the chain, shadowed ones included.
   pub fn depth(&self) -> usize {
      self.nodes().count()
   }

   fn nodes(&self) -> impl Iterator<Item = &Node> {
      let mut cursor = self.head.as_deref();
      core::iter::from_fn(move || {
         let node = cursor?;
         cursor = node.parent.as_deref();
         Some(node)
      })
   }
}

impl fmt::Debug for Context {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Context")
         .field("depth", &self.depth())
         .field("call_cache", &self.call_cache().is_some())
         .finish()
   }
}
