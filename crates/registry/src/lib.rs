//! Model registry: the store every subsystem shares and the backend
//! seam model internals hide behind.

mod backend;
mod store;

pub use backend::{BackendError, ModelBackend, PredictionResult, TrainReport};
pub use store::{InMemoryModelStore, ModelMutation, ModelStore, Result, StoreError};
