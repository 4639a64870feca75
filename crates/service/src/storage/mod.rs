//! Storage for the service layer
//!
//! In-process collections owned by one entity service each; nothing here is
//! shared or persisted.

pub mod memory_store;
