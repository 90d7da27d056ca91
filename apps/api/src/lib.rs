pub mod annotation;
pub mod association;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod image;
pub mod models;
pub mod moment;
pub mod observation;
pub mod routes;
pub mod state;
pub mod store;
