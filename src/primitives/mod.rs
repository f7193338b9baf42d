//! Low-level text primitives

pub mod query_scanner;
