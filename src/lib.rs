pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod redirect;
pub mod service;
pub mod shortcode;
pub mod storage;
pub mod telemetry;
