//! Infrastructure layer - persistence backends

pub mod state;

pub use state::{MemoryStore, StateStore, StateTx};
