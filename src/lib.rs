// Library interface for the editor
// Exposes the document model, query machinery and services for the binary
// and for integration tests

pub mod app;
pub mod config;
pub mod input;
pub mod model;
pub mod primitives;
pub mod query;
pub mod services;
pub mod state;
pub mod view;
