//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the boundary traits and wires up services.

pub mod access;
pub mod di;
pub mod error;
pub mod storage;
pub mod traits;

pub use access::ActorPolicy;
pub use di::ServiceContainer;
pub use error::{InfraError, InfraResult};
pub use storage::{JsonFileStorage, MemoryStorage};
