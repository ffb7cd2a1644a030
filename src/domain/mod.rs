//! Domain layer - account rules and the capabilities they depend on

pub mod account;
pub mod error;

pub use error::DomainError;
