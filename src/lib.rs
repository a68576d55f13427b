pub mod config;
pub mod error;
pub mod prediction;
pub mod server;
pub mod service;
pub mod store;

pub use error::{Error, Result};
