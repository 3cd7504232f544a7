pub mod actions;
pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod models;
pub mod routes;
pub mod state;
pub mod supabase;
pub mod views;
