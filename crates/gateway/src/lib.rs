pub mod config;
pub mod pipeline;
pub mod routes;
pub mod state;
