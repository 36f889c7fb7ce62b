//! Persistence of trees
//!
//! The stored form is acyclic (digest, left, right) with no parent
//! pointers; loading re-derives them before the tree is handed back.

mod file;
mod snapshot;

pub use file::{load, save, Format};
pub use snapshot::{PersistedNode, PersistedTree};
