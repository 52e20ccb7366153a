pub mod api;
pub mod mqtt;
