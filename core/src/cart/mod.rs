// cartsync/src/cart/mod.rs

//! Cart state: the persisted record, the hydrated view and the change signal.

pub mod entry;
pub mod notifier;
pub mod reconciler;
pub mod store;

pub use entry::{decode_entries, encode_entries, CartEntry, ProductId};
pub use notifier::{ChangeFeed, ChangeNotifier, Subscription};
pub use reconciler::{CartReconciler, FetchFailure, HydratedLineItem, ReconcileReport};
pub use store::{AddOutcome, PersistedCartStore};
