//! Concrete inference provider implementations.

pub mod openarena;

pub use openarena::OpenArenaProvider;
