//! Storage abstractions for snapshot persistence.
//!
//! The previous run's snapshot is the only state shared between runs. It
//! is read once at the start of a run and replaced wholesale, at most
//! once, at the end.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalSnapshotStore;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted snapshot text. A missing snapshot is `""`.
    async fn load(&self) -> Result<String>;

    /// Replace the persisted snapshot text.
    async fn save(&self, snapshot: &str) -> Result<()>;
}
