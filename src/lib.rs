// ABOUTME: Library root for chainlift - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod health;
pub mod inbound;
pub mod pipeline;
pub mod publish;
pub mod record;
pub mod stage;
pub mod types;
