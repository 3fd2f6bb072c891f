#![doc = "The `listforge` library crate."]
#![doc = ""]
#![doc = "Domain models, the session use-case with its token and password primitives,"]
#![doc = "the persistence seams, routing configuration and error handling for the"]
#![doc = "ListForge to-do backend. The binary (`main.rs`) wires them to Postgres."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
