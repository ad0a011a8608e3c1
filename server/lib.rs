pub mod collector;
pub mod config;
pub mod routes;
