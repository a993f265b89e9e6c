//! One-shot execution gate used by [`CacheCell`](crate::CacheCell).
//!
//! A gate moves through three phases:
//!
//! ```text
//!  Unstarted --claim--> Running --publish--> Done
//!      ^                   |
//!      +----- abandon -----+
//! ```
//!
//! Exactly one caller wins `claim` and receives a [`Run`]. Everyone else who
//! finds the gate `Running` waits: threads park on the gate's address through
//! `parking_lot_core`, tasks wait on a `tokio::sync::Notify`. `Done` is final.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
enum Phase {
   Unstarted = 0,
   Running = 1,
   Done = 2,
}

impl Phase {
   #[inline]
   const fn from_raw(raw: u8) -> Self {
      match raw {
         0 => Self::Unstarted,
         1 => Self::Running,
         _ => Self::Done,
      }
   }
}

/// Outcome of a single attempt at claiming the gate.
enum Claim<'a> {
   Run(Run<'a>),
   Busy,
   Done,
}

pub(crate) struct Gate {
   phase: AtomicU8,
   // Threads currently inside `park`. Lets `publish` skip the unpark syscall
   // path when nobody is blocked.
   sleepers: AtomicUsize,
   #[cfg(feature = "async-tokio")]
   notify: tokio::sync::Notify,
}

impl Gate {
   pub(crate) fn new() -> Self {
      Self {
         phase: AtomicU8::new(Phase::Unstarted as u8),
         sleepers: AtomicUsize::new(0),
         #[cfg(feature = "async-tokio")]
         notify: tokio::sync::Notify::new(),
      }
   }

   #[inline]
   fn phase(&self, order: Ordering) -> Phase {
      Phase::from_raw(self.phase.load(order))
   }

   /// `Done` loads with Acquire, pairing with the Release in `publish`.
   #[inline]
   pub(crate) fn is_done(&self) -> bool {
      self.phase(Ordering::Acquire) == Phase::Done
   }

   fn claim(&self) -> Claim<'_> {
      match self.phase.compare_exchange(
         Phase::Unstarted as u8,
         Phase::Running as u8,
         Ordering::Acquire,
         Ordering::Acquire,
      ) {
         Ok(_) => Claim::Run(Run { gate: self }),
         Err(raw) if Phase::from_raw(raw) == Phase::Done => Claim::Done,
         Err(_) => Claim::Busy,
      }
   }

   /// Blocks the thread until the current run is published or abandoned.
   fn sleep_while_running(&self) {
      self.sleepers.fetch_add(1, Ordering::SeqCst);
      let key = self as *const Self as usize;
      // SAFETY: `wake_sleepers` unparks with the same key. The validate closure
      // runs under the bucket lock, so a transition that happens before we
      // sleep is always observed.
      unsafe {
         let _ = parking_lot_core::park(
            key,
            || self.phase(Ordering::SeqCst) == Phase::Running,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
      self.sleepers.fetch_sub(1, Ordering::SeqCst);
   }

   fn wake_sleepers(&self) {
      if self.sleepers.load(Ordering::SeqCst) > 0 {
         let key = self as *const Self as usize;
         // SAFETY: same key as `sleep_while_running`.
         unsafe {
            parking_lot_core::unpark_all(key, DEFAULT_UNPARK_TOKEN);
         }
      }
      #[cfg(feature = "async-tokio")]
      self.notify.notify_waiters();
   }

   /// Claims the gate, blocking while another caller runs.
   ///
   /// `None` means the gate is done and the slot can be read.
   pub(crate) fn claim_blocking(&self) -> Option<Run<'_>> {
      loop {
         match self.claim() {
            Claim::Run(run) => return Some(run),
            Claim::Done => return None,
            Claim::Busy => self.sleep_while_running(),
         }
      }
   }

   /// Async counterpart of [`Gate::claim_blocking`]. Waiting tasks never block
   /// their worker thread.
   #[cfg(feature = "async-tokio")]
   pub(crate) async fn claim_async(&self) -> Option<Run<'_>> {
      loop {
         match self.claim() {
            Claim::Run(run) => return Some(run),
            Claim::Done => return None,
            Claim::Busy => {}
         }
         let mut notified = core::pin::pin!(self.notify.notified());
         // Register before re-checking so a publish in between is not missed.
         notified.as_mut().enable();
         if self.phase(Ordering::SeqCst) == Phase::Running {
            notified.await;
         }
      }
   }
}

/// The right to run the producer of one gate.
///
/// [`Run::publish`] marks the gate done. Dropping an unpublished run (the
/// producer panicked or its future was dropped) puts the gate back to
/// unstarted so a waiter can claim it.
pub(crate) struct Run<'a> {
   gate: &'a Gate,
}

impl Run<'_> {
   pub(crate) fn publish(self) {
      self.gate.phase.store(Phase::Done as u8, Ordering::SeqCst);
      self.gate.wake_sleepers();
      core::mem::forget(self);
   }
}

impl Drop for Run<'_> {
   fn drop(&mut self) {
      tracing::debug!("producer abandoned before completing, reopening cell");
      self.gate.phase.store(Phase::Unstarted as u8, Ordering::SeqCst);
      self.gate.wake_sleepers();
   }
}
