pub mod admin;
pub mod api;
pub mod backend;
pub mod models;
