pub mod config;
pub mod errors;
pub mod pipeline;
pub mod schema;
pub mod storage;
