//! Snapshot persistence adapters.

mod in_memory;

pub use in_memory::InMemorySnapshotStore;
