pub mod errors;
pub mod http_client;
pub mod models;
pub mod time_fmt;
pub mod tracing;
