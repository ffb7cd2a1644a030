//! Infrastructure layer - adapters for the account capabilities

pub mod account;
pub mod logging;
