//! Domain models shared across GCDA clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

// ========================================
// Session
// ========================================

/// Authenticated identity, held for the lifetime of a login session
///
/// Created by a successful authentication round-trip and destroyed on
/// logout or expiry detection. The role is immutable for the session's
/// lifetime; a role change on the backend requires a fresh login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// Bearer token presented on authenticated calls
    pub token: String,
    /// Expiry instant taken from the token's `exp` claim
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session past its expiry is treated identically to no session
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

// ========================================
// Task
// ========================================

/// One unit of labeling work: a single web page awaiting a verdict
///
/// Immutable once created; a newly assigned task supersedes (never mutates)
/// the previous one. The workflow controller holds at most one current task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub website_id: i64,
    pub url: String,
    /// Reviewer the backend assigned this task to
    pub reviewer_id: i64,
    /// Backend-issued start timestamp, echoed verbatim on submission
    pub start_time: String,
}

// ========================================
// Labels and Classification
// ========================================

/// Final verdict a reviewer assigns to a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelValue {
    #[serde(rename = "GenAI")]
    GenAi,
    #[serde(rename = "NotGenAI")]
    NotGenAi,
}

impl LabelValue {
    /// Wire representation used by the submission form
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelValue::GenAi => "GenAI",
            LabelValue::NotGenAi => "NotGenAI",
        }
    }

    /// Parse a verdict, case-insensitively
    pub fn parse(s: &str) -> Option<LabelValue> {
        match s.to_ascii_lowercase().as_str() {
            "genai" => Some(LabelValue::GenAi),
            "notgenai" => Some(LabelValue::NotGenAi),
            _ => None,
        }
    }
}

/// Automated classifier verdict over a page
///
/// Closed set defined by the scoring service. Distinct from [`LabelValue`]:
/// a classification is a suggestion and is never applied to the draft's
/// verdict automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    AiGenerated,
    HumanCreated,
    Uncertain,
}

// ========================================
// Preselection
// ========================================

/// Normalized outcome of an AI preselection call
///
/// Transient: owned by the workflow controller, applied to the label draft
/// at most once, and discarded when the task it was computed for is
/// superseded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreselectionResult {
    pub classification: Option<Classification>,
    /// Scorer confidence, 0-100
    pub confidence_score: Option<u8>,
    pub ai_indicator_ids: Vec<String>,
    pub human_indicator_ids: Vec<String>,
    pub reasoning: Option<String>,
}

// ========================================
// Tests
// ========================================
