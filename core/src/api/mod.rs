// cartsync/src/api/mod.rs

//! HTTP implementations of the catalog and order seams.

pub mod catalog;
pub mod client;
pub mod orders;

pub use catalog::HttpCatalog;
pub use client::ApiClient;
pub use orders::HttpOrderGateway;
