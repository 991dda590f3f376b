//! External capability interfaces consumed by the core.
//!
//! These are contracts, not implementations: the KV store, durable
//! key-value store, object store, queue, and source loader are backing
//! services owned by the embedding host. The core only needs to call them
//! through a narrow trait; it never owns their persistence.

mod durable_kv;
mod kv;
mod object_store;
mod queue;
mod source_loader;

pub use durable_kv::{DurableKv, ObjectId};
pub use kv::{KvList, KvListEntry, KvStore};
pub use object_store::{ObjectMetadata, ObjectStore};
pub use queue::Queue;
pub use source_loader::{ResolvedSource, SourceLoader};
