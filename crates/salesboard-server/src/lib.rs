pub mod app;
pub mod config;
pub mod crm;
pub mod handlers;
pub mod roster;
pub mod services;
pub mod state;
pub mod utils;
