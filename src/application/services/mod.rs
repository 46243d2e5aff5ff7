//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on boundary traits (Storage, AccessPolicy)
//! but are themselves concrete structs, not traits.

mod product;
mod registry;
mod seed;

pub use product::{ProductQuery, ProductService};
pub use registry::{NodeQuery, RegistryService};
pub use seed::{seed_demo, SeedReport};
