pub mod app;
pub mod config;
pub mod dashboard;
pub mod enrich;
pub mod error;
pub mod models;
pub mod query;
pub mod tmdb;
