//! Asynchronous services

pub mod async_bridge;
pub mod resolution;
