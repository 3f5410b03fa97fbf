//! # GCDA Labeler Client
//!
//! Workflow controller for the GenAI content labeling loop:
//! - Backend API services (auth, task acquisition, preselection, submission)
//! - Session persistence and restoration
//! - Indicator catalog loading with built-in defaults
//! - Label draft state
//! - The workflow state machine tying it all together
//!
//! Rendering stays out of this crate: the binary is a thin line-oriented
//! surface that subscribes to workflow events and forwards commands.

pub mod api;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod session;
pub mod workflow;
