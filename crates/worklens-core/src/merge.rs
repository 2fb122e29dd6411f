use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::task::SubtaskDraft;

/// One positional assignment from the external suggestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub subtask_index: usize,
    pub user_id: String,
}

/// Opaque result of a suggestion call: `{"assignments": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResult {
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

/// Merges suggested assignments into a draft list by positional index.
/// Indices absent from the suggestion are left untouched; out-of-range
/// indices are ignored. A single-index result and a full-coverage
/// result go through the same path. Returns the number of drafts
/// updated.
pub fn merge_assignments(drafts: &mut [SubtaskDraft], suggestion: &SuggestionResult) -> usize {
    let mut merged = 0;

    for assignment in &suggestion.assignments {
        match drafts.get_mut(assignment.subtask_index) {
            Some(draft) => {
                draft.assigned_to = Some(assignment.user_id.clone());
                merged += 1;
            }
            None => {
                warn!(
                    index = assignment.subtask_index,
                    drafts = drafts.len(),
                    "ignoring out-of-range assignment suggestion"
                );
            }
        }
    }

    debug!(merged, total = suggestion.assignments.len(), "merged assignments");
    merged
}

#[cfg(test)]
mod tests {
    use super::{Assignment, SuggestionResult, merge_assignments};
    use crate::task::SubtaskDraft;

    fn draft(title: &str) -> SubtaskDraft {
        SubtaskDraft {
            title: title.to_string(),
            description: None,
            assigned_to: None,
        }
    }

    #[test]
    fn single_index_merge_leaves_others_untouched() {
        let mut drafts = vec![draft("a"), draft("b")];
        let suggestion = SuggestionResult {
            assignments: vec![Assignment {
                subtask_index: 1,
                user_id: "u9".to_string(),
            }],
        };

        let merged = merge_assignments(&mut drafts, &suggestion);

        assert_eq!(merged, 1);
        assert_eq!(drafts[0].assigned_to, None);
        assert_eq!(drafts[1].assigned_to, Some("u9".to_string()));
    }

    #[test]
    fn full_coverage_merge_overwrites_existing_assignments() {
        let mut drafts = vec![draft("a"), draft("b")];
        drafts[0].assigned_to = Some("stale".to_string());

        let suggestion = SuggestionResult {
            assignments: vec![
                Assignment {
                    subtask_index: 0,
                    user_id: "u1".to_string(),
                },
                Assignment {
                    subtask_index: 1,
                    user_id: "u2".to_string(),
                },
            ],
        };

        assert_eq!(merge_assignments(&mut drafts, &suggestion), 2);
        assert_eq!(drafts[0].assigned_to, Some("u1".to_string()));
        assert_eq!(drafts[1].assigned_to, Some("u2".to_string()));
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut drafts = vec![draft("a")];
        let suggestion = SuggestionResult {
            assignments: vec![Assignment {
                subtask_index: 5,
                user_id: "u9".to_string(),
            }],
        };

        assert_eq!(merge_assignments(&mut drafts, &suggestion), 0);
        assert_eq!(drafts[0].assigned_to, None);
    }

    #[test]
    fn empty_suggestion_is_a_no_op() {
        let mut drafts = vec![draft("a")];
        assert_eq!(merge_assignments(&mut drafts, &SuggestionResult::default()), 0);
    }
}
