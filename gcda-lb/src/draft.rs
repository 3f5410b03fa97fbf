//! Label draft state
//!
//! The mutable form a reviewer fills in for the current task. Created fresh
//! whenever the current task changes, mutated by user interaction and by an
//! accepted preselection result, and discarded on successful submission or
//! task replacement.

use gcda_common::api::types::SubmitLabelForm;
use gcda_common::models::{LabelValue, PreselectionResult, Task};
use gcda_common::{Error, Result};

/// Draft of the label form for one task
///
/// Selections are ordered-unique vectors rather than sets: the submission
/// wire format joins them in selection order. Indicator ids are not checked
/// against the catalog here; ids the scorer knows but the catalog does not
/// are deliberately tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDraft {
    label_value: Option<LabelValue>,
    tags: Vec<String>,
    selected_ai: Vec<String>,
    selected_human: Vec<String>,
}

impl LabelDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label_value(&self) -> Option<LabelValue> {
        self.label_value
    }

    pub fn set_label(&mut self, value: LabelValue) {
        self.label_value = Some(value);
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn ai_indicators(&self) -> &[String] {
        &self.selected_ai
    }

    pub fn human_indicators(&self) -> &[String] {
        &self.selected_human
    }

    /// Toggle a tag; returns whether it is selected afterwards
    ///
    /// Input is trimmed; input that trims to nothing is ignored.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        toggle(&mut self.tags, tag)
    }

    /// Toggle an AI-indicator selection; returns whether it is selected afterwards
    pub fn toggle_ai_indicator(&mut self, id: &str) -> bool {
        toggle(&mut self.selected_ai, id.trim())
    }

    /// Toggle a human-indicator selection; returns whether it is selected afterwards
    pub fn toggle_human_indicator(&mut self, id: &str) -> bool {
        toggle(&mut self.selected_human, id.trim())
    }

    /// Merge preselection suggestions into the current selections
    ///
    /// Union semantics: suggested ids are appended after anything the
    /// reviewer already picked, without duplicates, and nothing is ever
    /// removed. The suggested verdict is NOT applied to `label_value`; the
    /// final call stays with the reviewer.
    pub fn apply_preselection(&mut self, result: &PreselectionResult) {
        for id in &result.ai_indicator_ids {
            if !self.selected_ai.iter().any(|v| v == id) {
                self.selected_ai.push(id.clone());
            }
        }
        for id in &result.human_indicator_ids {
            if !self.selected_human.iter().any(|v| v == id) {
                self.selected_human.push(id.clone());
            }
        }
    }

    /// Serialize into the submission wire format
    ///
    /// The task supplies identity and the start-time echo; list fields are
    /// comma-joined in selection order.
    ///
    /// # Errors
    /// `Validation` when the verdict is unset or the task carries no start
    /// time; both are caught before any network attempt.
    pub fn to_form(&self, task: &Task) -> Result<SubmitLabelForm> {
        let label_value = self.label_value.ok_or_else(|| {
            Error::Validation("Select a verdict (GenAI or NotGenAI) before submitting".to_string())
        })?;
        if task.start_time.trim().is_empty() {
            return Err(Error::Validation(
                "Task start time is missing; re-request the task".to_string(),
            ));
        }
        Ok(SubmitLabelForm {
            website_id: task.website_id,
            user_id: task.reviewer_id,
            label_value: label_value.as_str().to_string(),
            tags_str: self.tags.join(","),
            ai_indicators_str: self.selected_ai.join(","),
            human_indicators_str: self.selected_human.join(","),
            task_start_time: task.start_time.clone(),
        })
    }
}

fn toggle(list: &mut Vec<String>, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
        false
    } else {
        list.push(value.to_string());
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gcda_common::models::Classification;

    fn task() -> Task {
        Task {
            website_id: 12,
            url: "https://example.com/article".to_string(),
            reviewer_id: 7,
            start_time: "2026-08-01T10:15:00".to_string(),
        }
    }

    #[test]
    fn test_fresh_draft_is_empty() {
        let draft = LabelDraft::new();
        assert!(draft.label_value().is_none());
        assert!(draft.tags().is_empty());
        assert!(draft.ai_indicators().is_empty());
        assert!(draft.human_indicators().is_empty());
    }

    #[test]
    fn test_form_round_trip_in_selection_order() {
        let mut draft = LabelDraft::new();
        draft.set_label(LabelValue::GenAi);
        draft.toggle_tag("news");
        draft.toggle_tag("blog");
        draft.toggle_ai_indicator("perfect_grammar");
        draft.toggle_ai_indicator("generic_phrasing");
        draft.toggle_human_indicator("minor_typos");

        let form = draft.to_form(&task()).unwrap();
        assert_eq!(form.website_id, 12);
        assert_eq!(form.user_id, 7);
        assert_eq!(form.label_value, "GenAI");
        assert_eq!(form.tags_str, "news,blog");
        assert_eq!(form.ai_indicators_str, "perfect_grammar,generic_phrasing");
        assert_eq!(form.human_indicators_str, "minor_typos");
        assert_eq!(form.task_start_time, "2026-08-01T10:15:00");
    }

    #[test]
    fn test_form_requires_verdict() {
        let draft = LabelDraft::new();
        let err = draft.to_form(&task()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_form_requires_start_time() {
        let mut draft = LabelDraft::new();
        draft.set_label(LabelValue::NotGenAi);
        let mut bad_task = task();
        bad_task.start_time = "  ".to_string();
        assert!(matches!(
            draft.to_form(&bad_task).unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[test]
    fn test_toggle_twice_removes() {
        let mut draft = LabelDraft::new();
        assert!(draft.toggle_ai_indicator("perfect_grammar"));
        assert!(!draft.toggle_ai_indicator("perfect_grammar"));
        assert!(draft.ai_indicators().is_empty());
    }

    #[test]
    fn test_tags_trimmed_and_empty_ignored() {
        let mut draft = LabelDraft::new();
        assert!(draft.toggle_tag("  news "));
        assert!(!draft.toggle_tag("   "));
        assert_eq!(draft.tags(), &["news".to_string()]);
        // Trimmed form matches the stored one
        assert!(!draft.toggle_tag("news"));
        assert!(draft.tags().is_empty());
    }

    #[test]
    fn test_apply_preselection_unions_after_user_picks() {
        let mut draft = LabelDraft::new();
        draft.toggle_ai_indicator("structured_lists");

        let result = PreselectionResult {
            classification: Some(Classification::AiGenerated),
            confidence_score: Some(90),
            ai_indicator_ids: vec![
                "structured_lists".to_string(),
                "perfect_grammar".to_string(),
            ],
            human_indicator_ids: vec!["minor_typos".to_string()],
            reasoning: None,
        };
        draft.apply_preselection(&result);

        // User's pick keeps its position, suggestion appended once
        assert_eq!(
            draft.ai_indicators(),
            &["structured_lists".to_string(), "perfect_grammar".to_string()]
        );
        assert_eq!(draft.human_indicators(), &["minor_typos".to_string()]);
        // The suggested verdict never touches the draft's label
        assert!(draft.label_value().is_none());
    }

    #[test]
    fn test_apply_preselection_is_idempotent() {
        let mut draft = LabelDraft::new();
        let result = PreselectionResult {
            ai_indicator_ids: vec!["generic_examples".to_string()],
            ..Default::default()
        };
        draft.apply_preselection(&result);
        draft.apply_preselection(&result);
        assert_eq!(draft.ai_indicators().len(), 1);
    }

    #[test]
    fn test_unknown_indicator_ids_are_kept() {
        // Scorer may know cues the local catalog does not; they still count
        let mut draft = LabelDraft::new();
        let result = PreselectionResult {
            ai_indicator_ids: vec!["brand_new_cue".to_string()],
            ..Default::default()
        };
        draft.apply_preselection(&result);
        assert_eq!(draft.ai_indicators(), &["brand_new_cue".to_string()]);
    }
}
