//! `PostgreSQL` adapters for sprint board persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BoardPgPool, PostgresBoardRepository};
