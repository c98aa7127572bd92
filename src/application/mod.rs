pub mod builder;
pub mod cache;
pub mod dto;
pub mod errors;
pub mod expiration;
pub mod ports;
pub mod timeouts;
pub mod use_cases;
pub mod validation;
