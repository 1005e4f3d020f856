pub mod handlers;
pub mod models;
pub mod origin;
pub mod routes;
