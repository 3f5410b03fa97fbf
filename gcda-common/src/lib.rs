//! # GCDA Common Library
//!
//! Shared code for the GenAI Content Detection Assistant clients including:
//! - Domain models (sessions, tasks, labels, preselection results)
//! - Role hierarchy and authorization checks
//! - Workflow event types (WorkflowEvent enum) and EventBus
//! - Backend API request/response types
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod roles;

pub use error::{Error, Result};
pub use roles::Role;
