//! Persistence layer: backend-agnostic entities and the [`game_store`]
//! abstraction with its MongoDB implementation.

pub mod game_store;
pub mod models;
pub mod storage;
