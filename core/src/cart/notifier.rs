// cartsync/src/cart/notifier.rs

//! Cart-changed signal for UI surfaces that share no in-memory state.
//!
//! Two sources trigger a handler: `notify_changed` in the same context, and a
//! write to the cart key made by another context (delivered through the
//! `SharedStorage` event hub). The signal carries no payload; handlers
//! re-read the `PersistedCartStore`.

use crate::storage::{StorageHandle, StorageListener};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{event, Level};

type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

struct HandlerEntry {
  id: u64,
  live: Arc<AtomicBool>,
  handler: ChangeHandler,
}

#[derive(Default)]
struct Registry {
  next_id: u64,
  handlers: Vec<HandlerEntry>,
}

fn dispatch(registry: &Mutex<Registry>) {
  let targets: Vec<(Arc<AtomicBool>, ChangeHandler)> = {
    let guard = registry.lock();
    guard
      .handlers
      .iter()
      .map(|h| (Arc::clone(&h.live), Arc::clone(&h.handler)))
      .collect()
  };
  event!(Level::TRACE, handlers = targets.len(), "Dispatching cart-changed signal.");
  for (live, handler) in targets {
    // A handler disposed by an earlier handler in this same dispatch is skipped.
    if live.load(Ordering::Acquire) {
      handler();
    }
  }
}

/// Publish/subscribe hub for the cart-changed signal of one execution context.
///
/// Clones share subscribers. The bridge to storage events lives as long as
/// any clone does.
#[derive(Clone)]
pub struct ChangeNotifier {
  registry: Arc<Mutex<Registry>>,
  _bridge: Option<Arc<StorageListener>>,
}

impl ChangeNotifier {
  /// A notifier that also fires when another context writes `cart_key`.
  pub fn new(storage: &StorageHandle, cart_key: &str) -> Self {
    let registry = Arc::new(Mutex::new(Registry::default()));
    let weak = Arc::downgrade(&registry);
    let key = cart_key.to_string();
    let listener = storage.listen(move |storage_event| {
      if storage_event.key != key {
        return;
      }
      if let Some(registry) = weak.upgrade() {
        event!(Level::DEBUG, origin = %storage_event.origin, "Cart changed in another context.");
        dispatch(&registry);
      }
    });
    Self {
      registry,
      _bridge: Some(Arc::new(listener)),
    }
  }

  /// A notifier with no storage bridge; only `notify_changed` triggers it.
  pub fn local() -> Self {
    Self {
      registry: Arc::new(Mutex::new(Registry::default())),
      _bridge: None,
    }
  }

  /// Invokes every live handler of this context.
  pub fn notify_changed(&self) {
    dispatch(&self.registry);
  }

  /// Registers `handler`. It runs until the returned `Subscription` is
  /// disposed or dropped.
  #[must_use = "dropping the subscription unregisters the handler"]
  pub fn on_changed(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
    let live = Arc::new(AtomicBool::new(true));
    let id = {
      let mut guard = self.registry.lock();
      let id = guard.next_id;
      guard.next_id += 1;
      guard.handlers.push(HandlerEntry {
        id,
        live: Arc::clone(&live),
        handler: Arc::new(handler),
      });
      id
    };
    Subscription {
      registry: Arc::downgrade(&self.registry),
      id,
      live,
    }
  }

  /// Async view of the signal for a UI loop.
  ///
  /// The feed holds a change counter rather than a queue, so an unpolled
  /// feed costs nothing per change.
  pub fn watch(&self) -> ChangeFeed {
    let (tx, rx) = watch::channel(0u64);
    let subscription = self.on_changed(move || {
      tx.send_modify(|version| *version = version.wrapping_add(1));
    });
    ChangeFeed {
      rx,
      seen: 0,
      _subscription: subscription,
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.registry.lock().handlers.len()
  }
}

/// Registration handle returned by `ChangeNotifier::on_changed`.
pub struct Subscription {
  registry: Weak<Mutex<Registry>>,
  id: u64,
  live: Arc<AtomicBool>,
}

impl Subscription {
  pub fn is_active(&self) -> bool {
    self.live.load(Ordering::Acquire)
  }

  /// Unregisters the handler. Same as dropping the subscription.
  pub fn dispose(self) {}
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.live.store(false, Ordering::Release);
    if let Some(registry) = self.registry.upgrade() {
      registry.lock().handlers.retain(|h| h.id != self.id);
    }
  }
}

/// Stream of cart-changed signals. Changes made while nobody awaits the
/// feed fold into a single wake-up.
pub struct ChangeFeed {
  rx: watch::Receiver<u64>,
  seen: u64,
  _subscription: Subscription,
}

impl ChangeFeed {
  /// Waits until something changed since the last call. Returns `false`
  /// once the notifier is gone and every change has been seen.
  pub async fn changed(&mut self) -> bool {
    if self.rx.changed().await.is_err() {
      return false;
    }
    self.mark_seen();
    true
  }

  /// Marks pending changes as seen and returns how many there were.
  pub fn drain(&mut self) -> usize {
    self.mark_seen()
  }

  fn mark_seen(&mut self) -> usize {
    let version = *self.rx.borrow_and_update();
    let pending = version.wrapping_sub(self.seen);
    self.seen = version;
    usize::try_from(pending).unwrap_or(usize::MAX)
  }
}
