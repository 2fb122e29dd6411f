use crate::projection::WorkItem;
use crate::task::{TaskNode, UserRef, Viewer};

/// Message a caller must surface when a completion toggle is rejected
/// because the task still owns subtasks. The engine only reports the
/// capability; it never raises.
pub const GATING_REJECTION: &str =
    "complete all subtasks to automatically complete this task";

/// What a viewer may do with one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Authorship-based: the creator (or a caller-asserted privileged
    /// context) may edit or delete.
    pub can_edit_or_delete: bool,
    /// Assignment-based, and gated: a task that owns subtasks cannot be
    /// completed directly.
    pub can_toggle_completion: bool,
}

pub fn resolve(node: &TaskNode, viewer: &Viewer, force_allow: bool) -> Capabilities {
    capabilities(
        &node.creator,
        &node.assignee,
        node.has_subtasks(),
        viewer,
        force_allow,
    )
}

pub fn resolve_item(item: &WorkItem, viewer: &Viewer, force_allow: bool) -> Capabilities {
    capabilities(
        &item.assigned_by,
        &item.assignee,
        item.subtask_count > 0,
        viewer,
        force_allow,
    )
}

fn capabilities(
    creator: &UserRef,
    assignee: &UserRef,
    has_subtasks: bool,
    viewer: &Viewer,
    force_allow: bool,
) -> Capabilities {
    Capabilities {
        can_edit_or_delete: force_allow || viewer.matches(creator),
        can_toggle_completion: viewer.matches(assignee) && !has_subtasks,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::resolve;
    use crate::task::{TaskNode, UserRef, Viewer};

    fn node(creator: &str, assignee: &str) -> TaskNode {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        TaskNode::new("t", UserRef::bare(assignee), UserRef::bare(creator), now)
    }

    #[test]
    fn edit_rights_follow_authorship() {
        let task = node("u1", "u2");

        let creator = Viewer::new("u1", "u1@example.com");
        let assignee = Viewer::new("u2", "u2@example.com");

        assert!(resolve(&task, &creator, false).can_edit_or_delete);
        assert!(!resolve(&task, &assignee, false).can_edit_or_delete);
        assert!(resolve(&task, &assignee, true).can_edit_or_delete);
    }

    #[test]
    fn completion_follows_assignment() {
        let task = node("u1", "u2");

        let creator = Viewer::new("u1", "u1@example.com");
        let assignee = Viewer::new("u2", "u2@example.com");

        assert!(!resolve(&task, &creator, false).can_toggle_completion);
        assert!(resolve(&task, &assignee, false).can_toggle_completion);
    }

    #[test]
    fn subtasks_gate_completion_even_for_the_assignee() {
        let mut task = node("u1", "u2");
        task.subtasks.push(node("u1", "u3"));

        let assignee = Viewer::new("u2", "u2@example.com");
        let caps = resolve(&task, &assignee, true);

        assert!(caps.can_edit_or_delete);
        assert!(!caps.can_toggle_completion);
    }
}
