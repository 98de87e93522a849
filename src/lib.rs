#![doc = "The `workforce` library crate."]
#![doc = ""]
#![doc = "Employees, projects and tasks behind stateless bearer-token authentication."]
#![doc = "Holds the domain models, the token codec and request authenticator, the"]
#![doc = "transactional store, the services and the HTTP routes. The binary (`main.rs`)"]
#![doc = "only reads configuration, picks a store and starts the server."]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;

pub use crate::app::AppServices;
pub use crate::error::{AppError, ErrorPath};
