pub mod api;
pub mod components;
pub mod config;
pub mod constants;
pub mod controller;
pub mod logging;
pub mod models;

pub use components::app::App;
