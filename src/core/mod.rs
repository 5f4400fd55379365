//! Shared building blocks that do not depend on the inference stack.

pub mod domain;
pub mod slug;
pub mod store;

pub use domain::Domain;
pub use slug::slugify;
pub use store::{KeyValueStore, MemoryStore};
