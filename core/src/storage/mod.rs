// cartsync/src/storage/mod.rs

//! String-keyed durable storage shared by several execution contexts.
//!
//! A `SharedStorage` plays the role browser local storage plays for a set of
//! open tabs: every context gets its own `StorageHandle`, all handles read and
//! write the same backend, and a write through one handle raises a
//! `StorageEvent` in every *other* context that listens. The writing context
//! itself is not told about its own write.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{event, Level};

/// A durable string-to-string map.
///
/// `set` must be a whole-value overwrite: a concurrent reader observes either
/// the previous value or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Identifies one execution context attached to a `SharedStorage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ctx-{}", self.0)
  }
}

/// Raised in other contexts after a key was written or removed. Carries no value;
/// observers re-read the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
  pub key: String,
  pub origin: ContextId,
}

type StorageCallback = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

struct ListenerEntry {
  id: u64,
  context: ContextId,
  callback: StorageCallback,
}

#[derive(Default)]
struct EventHub {
  next_listener_id: AtomicU64,
  listeners: Mutex<Vec<ListenerEntry>>,
}

impl EventHub {
  fn emit(&self, event: &StorageEvent) {
    // Callbacks run outside the lock so they may register or drop listeners.
    let targets: Vec<StorageCallback> = {
      let guard = self.listeners.lock();
      guard
        .iter()
        .filter(|l| l.context != event.origin)
        .map(|l| Arc::clone(&l.callback))
        .collect()
    };
    event!(Level::TRACE, key = %event.key, origin = %event.origin, listeners = targets.len(), "Dispatching storage event.");
    for callback in targets {
      callback(event);
    }
  }
}

/// Backend plus event hub. Cheap to clone; clones share both.
#[derive(Clone)]
pub struct SharedStorage {
  backend: Arc<dyn KeyValueStore>,
  hub: Arc<EventHub>,
  next_context: Arc<AtomicU64>,
}

impl SharedStorage {
  pub fn new(backend: impl KeyValueStore + 'static) -> Self {
    Self::from_arc(Arc::new(backend))
  }

  pub fn from_arc(backend: Arc<dyn KeyValueStore>) -> Self {
    Self {
      backend,
      hub: Arc::new(EventHub::default()),
      next_context: Arc::new(AtomicU64::new(1)),
    }
  }

  pub fn in_memory() -> Self {
    Self::new(MemoryStore::new())
  }

  /// Attaches a new execution context.
  pub fn attach(&self) -> StorageHandle {
    let context = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
    event!(Level::DEBUG, %context, "Execution context attached to shared storage.");
    StorageHandle {
      shared: self.clone(),
      context,
    }
  }
}

/// One context's view of a `SharedStorage`.
#[derive(Clone)]
pub struct StorageHandle {
  shared: SharedStorage,
  context: ContextId,
}

impl fmt::Debug for StorageHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("StorageHandle").field("context", &self.context).finish()
  }
}

impl StorageHandle {
  pub fn context_id(&self) -> ContextId {
    self.context
  }

  pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    self.shared.backend.get(key)
  }

  pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.shared.backend.set(key, value)?;
    self.emit(key);
    Ok(())
  }

  pub fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.shared.backend.remove(key)?;
    self.emit(key);
    Ok(())
  }

  /// Registers `callback` for writes made by other contexts. The callback
  /// stays registered until the returned guard is dropped.
  pub fn listen(&self, callback: impl Fn(&StorageEvent) + Send + Sync + 'static) -> StorageListener {
    let hub = &self.shared.hub;
    let id = hub.next_listener_id.fetch_add(1, Ordering::Relaxed);
    hub.listeners.lock().push(ListenerEntry {
      id,
      context: self.context,
      callback: Arc::new(callback),
    });
    StorageListener {
      hub: Arc::downgrade(hub),
      id,
    }
  }

  fn emit(&self, key: &str) {
    self.shared.hub.emit(&StorageEvent {
      key: key.to_string(),
      origin: self.context,
    });
  }
}

/// Keeps a storage listener registered. Unregisters on drop.
pub struct StorageListener {
  hub: Weak<EventHub>,
  id: u64,
}

impl Drop for StorageListener {
  fn drop(&mut self) {
    if let Some(hub) = self.hub.upgrade() {
      hub.listeners.lock().retain(|l| l.id != self.id);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  #[test]
  fn writes_are_visible_to_every_context() {
    let shared = SharedStorage::in_memory();
    let a = shared.attach();
    let b = shared.attach();
    assert_ne!(a.context_id(), b.context_id());

    a.set("cart", "[]").unwrap();
    assert_eq!(b.get("cart").unwrap().as_deref(), Some("[]"));
    b.remove("cart").unwrap();
    assert_eq!(a.get("cart").unwrap(), None);
  }

  #[test]
  fn events_skip_the_writing_context() {
    let shared = SharedStorage::in_memory();
    let a = shared.attach();
    let b = shared.attach();

    let seen_by_a = Arc::new(AtomicUsize::new(0));
    let seen_by_b = Arc::new(AtomicUsize::new(0));
    let counter_a = seen_by_a.clone();
    let counter_b = seen_by_b.clone();
    let _la = a.listen(move |_| {
      counter_a.fetch_add(1, Ordering::SeqCst);
    });
    let _lb = b.listen(move |event| {
      assert_eq!(event.key, "cart");
      counter_b.fetch_add(1, Ordering::SeqCst);
    });

    a.set("cart", "[]").unwrap();
    assert_eq!(seen_by_a.load(Ordering::SeqCst), 0);
    assert_eq!(seen_by_b.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn dropped_listener_is_unregistered() {
    let shared = SharedStorage::in_memory();
    let a = shared.attach();
    let b = shared.attach();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let listener = b.listen(move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
    });

    a.set("k", "1").unwrap();
    drop(listener);
    a.set("k", "2").unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }
}
