pub mod kdtree;

// Re-export the index facade for convenience if other top-level modules use it.
pub use kdtree::KdTreeIndex;
