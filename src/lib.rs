pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod models;
pub mod services;
pub mod state;
