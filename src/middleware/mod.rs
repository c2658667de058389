// Middleware for CORS

pub mod cors;

pub use cors::*;
