//! Backend API request/response types
//!
//! Wire shapes for every backend endpoint the labeler client consumes.
//! Response payloads with loose shapes (task acquisition, preselection) are
//! modeled as all-optional "raw" structs; the API service layer normalizes
//! them into domain types at the boundary.

use serde::{Deserialize, Serialize};

use crate::models::Classification;
use crate::roles::Role;

// ========================================
// Authentication Types
// ========================================

/// POST /auth/login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

/// POST /auth/login response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Backend user record, as returned by /auth/login and /users/me
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// POST /auth/signup request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

// ========================================
// Task Acquisition Types
// ========================================

/// GET /labeler/task raw response payload
///
/// The backend returns either task fields (`website_id`, `website_url`,
/// `user_id`, `task_start_time`) or a structured "no task available"
/// message (`message_title`, `message_body`), on the same 200 status.
/// All fields are optional here; the task service decides which shape
/// arrived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPayload {
    pub website_id: Option<i64>,
    pub website_url: Option<String>,
    pub user_id: Option<i64>,
    pub task_start_time: Option<String>,
    pub message_title: Option<String>,
    pub message_body: Option<String>,
}

// ========================================
// Preselection Types
// ========================================

/// POST /ai/preselect-indicators raw response payload
///
/// Two shapes have been observed in the field: flat
/// `preselected_ai_indicators` / `preselected_human_indicators` arrays, or
/// a nested `preselected_indicators` object carrying both lists. Both are
/// accepted; [`normalize`](crate::models::PreselectionResult) happens once
/// in the preselection service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreselectPayload {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub classification: Option<Classification>,
    pub confidence_score: Option<u8>,
    pub reasoning: Option<String>,
    pub preselected_ai_indicators: Option<Vec<String>>,
    pub preselected_human_indicators: Option<Vec<String>>,
    pub preselected_indicators: Option<PreselectedBlock>,
}

/// Nested indicator block used by the second preselection response shape
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreselectedBlock {
    #[serde(default)]
    pub ai_indicators: Vec<String>,
    #[serde(default)]
    pub human_indicators: Vec<String>,
}

// ========================================
// Submission Types
// ========================================

/// POST /labeler/submit_label form-encoded request body
///
/// String fields carry comma-joined lists in the reviewer's selection
/// order; `task_start_time` echoes the value received with the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitLabelForm {
    pub website_id: i64,
    pub user_id: i64,
    pub label_value: String,
    pub tags_str: String,
    pub ai_indicators_str: String,
    pub human_indicators_str: String,
    pub task_start_time: String,
}

// ========================================
// Miscellaneous Types
// ========================================

/// Simple `{message}` envelope returned by several endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /health response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ========================================
// Tests
// ========================================
