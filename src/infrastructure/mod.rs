pub mod config;
pub mod http;
pub mod routes;
pub mod token_store;
