// tests/cart_store_tests.rs
mod common;
use cartsync::{AddOutcome, FileStore, PersistedCartStore, ProductId, SharedStorage};
use common::*;
use serial_test::serial;

#[test]
#[serial]
fn add_is_idempotent() {
  setup_tracing();
  let (_shared, handle) = shared();
  let store = PersistedCartStore::new(handle, CART_KEY);

  assert_eq!(store.add(ProductId(5)).unwrap(), AddOutcome::Added);
  assert_eq!(store.add(ProductId(5)).unwrap(), AddOutcome::AlreadyInCart);

  let entries = store.read();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].quantity(), 1);
}

#[test]
fn add_keeps_existing_quantity() {
  let (_shared, handle) = shared();
  let store = seed(&handle, &[entry(5, 4)]);
  assert_eq!(store.add(ProductId(5)).unwrap(), AddOutcome::AlreadyInCart);
  assert_eq!(store.read(), vec![entry(5, 4)]);
}

#[test]
fn corrupt_record_reads_as_empty() {
  let (_shared, handle) = shared();
  handle.set(CART_KEY, "not-json").unwrap();
  let store = PersistedCartStore::new(handle.clone(), CART_KEY);
  assert!(store.read().is_empty());

  for raw in [r#"{"id": 1}"#, r#"[{"id": 1, "quantity": 0}]"#, r#"[{"id": -1, "quantity": 2}]"#, r#"[{"quantity": 2}]"#] {
    handle.set(CART_KEY, raw).unwrap();
    assert!(store.read().is_empty(), "expected empty cart for {raw}");
  }
}

#[test]
fn corrupt_record_is_overwritten_by_next_add() {
  let (_shared, handle) = shared();
  handle.set(CART_KEY, "not-json").unwrap();
  let store = PersistedCartStore::new(handle.clone(), CART_KEY);
  assert_eq!(store.add(ProductId(2)).unwrap(), AddOutcome::Added);
  assert_eq!(handle.get(CART_KEY).unwrap().as_deref(), Some(r#"[{"id":2,"quantity":1}]"#));
}

#[test]
fn record_uses_id_and_quantity_fields() {
  let (_shared, handle) = shared();
  handle
    .set(CART_KEY, r#"[{"id": 3, "quantity": 2, "name": "ignored"}, {"id": 9, "quantity": 1}]"#)
    .unwrap();
  let store = PersistedCartStore::new(handle, CART_KEY);
  assert_eq!(store.read(), vec![entry(3, 2), entry(9, 1)]);
  assert_eq!(store.len(), 2);
}

#[test]
fn clear_removes_record() {
  let (_shared, handle) = shared();
  let store = seed(&handle, &[entry(1, 1)]);
  store.clear().unwrap();
  assert_eq!(handle.get(CART_KEY).unwrap(), None);
  assert!(store.is_empty());
}

#[test]
fn custom_storage_key() {
  let (_shared, handle) = shared();
  let store = PersistedCartStore::new(handle.clone(), "guest_cart");
  store.add(ProductId(1)).unwrap();
  assert!(handle.get(CART_KEY).unwrap().is_none());
  assert!(handle.get("guest_cart").unwrap().is_some());
}

#[test]
fn file_backed_cart_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();

  {
    let shared = SharedStorage::new(FileStore::open(dir.path()).unwrap());
    let store = PersistedCartStore::new(shared.attach(), CART_KEY);
    store.add(ProductId(11)).unwrap();
    store.add(ProductId(12)).unwrap();
  }

  let shared = SharedStorage::new(FileStore::open(dir.path()).unwrap());
  let store = PersistedCartStore::new(shared.attach(), CART_KEY);
  assert_eq!(ids(&store.read()), vec![11, 12]);
}
