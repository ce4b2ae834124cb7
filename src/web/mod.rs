//! The web module for handling the Axum API.
//! Handlers translate HTTP into `PrintJobManager` calls and never decide
//! lifecycle questions themselves.

pub mod api;
pub mod models;
