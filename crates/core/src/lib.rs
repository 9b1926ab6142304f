pub mod config;
pub mod domain;
pub mod errors;

pub use domain::product::{
    CameraSpecifications, Product, ProductAttributes, ProductId, ProductImages, ProductPayload,
    Specifications, StorageOption,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
