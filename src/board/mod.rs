//! Sprint boards: lifecycle, ordered columns, and atomic reordering.
//!
//! Follows the hexagonal layout used across the crate: a pure `domain`,
//! `ports` describing collaborators, `adapters` implementing them, and
//! `services` orchestrating the whole.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
