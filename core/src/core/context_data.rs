// core/src/core/context_data.rs
use parking_lot::{
  MappedRwLockReadGuard,
  MappedRwLockWriteGuard, // Useful for "extracting" parts
  RwLock,
  RwLockReadGuard,
  RwLockWriteGuard,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory "abandon all enclosing sequences" marker.
///
/// Carried next to the caller's data rather than inside it. All clones share the
/// same flag. Engines check it before every handler; it never interrupts a handler
/// that is already running.
#[derive(Debug, Clone, Default)]
pub struct DoneSignal(Arc<AtomicBool>);

impl DoneSignal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn signal(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_signalled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Clears the marker so the same context can be run again.
  pub fn reset(&self) {
    self.0.store(false, Ordering::SeqCst);
  }
}

/// A wrapper for context data providing shared ownership and interior mutability
/// using parking_lot::RwLock, plus the run's `DoneSignal`.
///
/// IMPORTANT: Lock guards obtained from this struct are blocking and MUST NOT
/// be held across `.await` suspension points in asynchronous code.
#[derive(Debug)]
pub struct ContextData<T: Send + Sync + 'static> {
  data: Arc<RwLock<T>>,
  done: DoneSignal,
}

impl<T: Send + Sync + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    Self::with_done_signal(data, DoneSignal::new())
  }

  /// Wraps `data` with an existing signal, e.g. one the caller keeps to cancel from outside.
  pub fn with_done_signal(data: T, done: DoneSignal) -> Self {
    ContextData {
      data: Arc::new(RwLock::new(data)),
      done,
    }
  }

  /// Acquires a read lock.
  /// The returned guard MUST be dropped before any `.await` point.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.data.read()
  }

  /// Acquires a write lock.
  /// The returned guard MUST be dropped before any `.await` point.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.data.write()
  }

  /// Attempts to acquire a read lock without blocking.
  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
    self.data.try_read()
  }

  /// Attempts to acquire a write lock without blocking.
  pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
    self.data.try_write()
  }

  // Example: context_data.map_read(|data| &data.some_field)
  pub fn map_read<F, U: ?Sized>(&self, f: F) -> MappedRwLockReadGuard<'_, U>
  where
    F: FnOnce(&T) -> &U,
  {
    RwLockReadGuard::map(self.read(), f)
  }

  pub fn map_write<F, U: ?Sized>(&self, f: F) -> MappedRwLockWriteGuard<'_, U>
  where
    F: FnOnce(&mut T) -> &mut U,
  {
    RwLockWriteGuard::map(self.write(), f)
  }

  pub fn done_signal(&self) -> &DoneSignal {
    &self.done
  }

  /// Marks the run as done: the current container and every enclosing one skip
  /// all remaining handlers.
  pub fn mark_done(&self) {
    self.done.signal();
  }

  pub fn is_done(&self) -> bool {
    self.done.is_signalled()
  }
}

impl<T: Send + Sync + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData {
      data: Arc::clone(&self.data),
      done: self.done.clone(),
    }
  }
}

impl<T: Send + Sync + 'static + Default> Default for ContextData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
