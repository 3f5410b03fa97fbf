//! Shared API types for GCDA backend communication

pub mod types;
