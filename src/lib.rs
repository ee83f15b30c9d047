pub mod api;
pub mod attendance;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod pages;
pub mod session;
pub mod ui;
