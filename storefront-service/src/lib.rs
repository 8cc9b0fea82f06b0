pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod models;
pub mod payments;
pub mod schema;
pub mod storage;
pub mod video;
