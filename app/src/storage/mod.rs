//! Storage module
//!
//! Provides the key-value blob store backing persisted state.

pub mod blob_store;

pub use blob_store::BlobStore;
