//! Vector index lifecycle and similarity retrieval

mod index;
mod locks;
mod retriever;
pub mod sqlite_index;

pub use index::VectorIndex;
pub use locks::LocationLocks;
pub use retriever::Retriever;
pub use sqlite_index::SqliteVectorIndex;
