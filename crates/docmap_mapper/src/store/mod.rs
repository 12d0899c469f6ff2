//! Collection backends.
//!
//! The mapper only needs [`CollectionHandle`](crate::reference::CollectionHandle)
//! from a backend. [`MemoryStore`] keeps documents in process and is suitable
//! for tests and embedding.

mod memory;

pub use memory::{MemoryCollection, MemoryStore};
