#![doc = "The `tasktrack` library crate."]
#![doc = ""]
#![doc = "Domain models, the session authenticator, the task matcher, storage"]
#![doc = "backends, routing configuration and error handling for the task tracker."]
#![doc = "The binary (`main.rs`) wires them into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod search;
pub mod store;
pub mod views;

pub use crate::error::AppError;
