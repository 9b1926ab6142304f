pub mod repositories;

pub use repositories::{InMemoryProductRepository, ProductRepository, RepositoryError};
