pub mod allocator;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod health;
pub mod memory;
pub mod middleware;
pub mod quota;
pub mod redis;
pub mod response;
pub mod server;
pub mod service;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{Result, ShortenError};
pub use response::ShortenResponse;
pub use server::create_app;
