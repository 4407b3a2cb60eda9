//! Sprintboard: sprint-scoped issue boards with dense, atomically persisted
//! ordering.
//!
//! Issues sit in workflow columns and are ordered within each column by a
//! zero-based rank that stays dense across drag-and-drop moves. Sprints gate
//! which boards accept moves through a date-bounded lifecycle.
//!
//! # Architecture
//!
//! Sprintboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and identity
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration of fetches, moves, commits, and lifecycle
//!
//! # Modules
//!
//! - [`board`]: Sprint lifecycle, board model, reordering, and persistence

pub mod board;
