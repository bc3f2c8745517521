//! # Pathstore
//!
//! Path-addressable file and folder operations over a hierarchical storage
//! backend whose native API only lists children by name.
//!
//! ## Architecture
//!
//! - **backend**: The `HierarchicalStore` capability plus in-memory and local
//!   filesystem implementations
//! - **storage**: Path parsing and the `PathStorage` resolver (lookup, recursive
//!   folder creation, existence checks, move, create via temporary file)
//! - **config**: Configuration loading and validation

pub mod backend;
pub mod config;
pub mod storage;

pub use backend::{BackendError, HierarchicalStore, LocalStore, MemoryStore};
pub use storage::{PathStorage, StorageError, StorageOptions, StoragePath};
