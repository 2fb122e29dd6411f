use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::status::{Status, classify};
use crate::task::{Priority, TaskNode, UserRef, Viewer};

/// A flattened, viewer-scoped work item. Subtasks promoted into a
/// projection carry their parent's context (`assigned_by`, fallback
/// priority and tags, `parent_id`) and never re-expose children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "crate::task::lenient_date_serde")]
    pub deadline: Option<NaiveDate>,
    pub completed: bool,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub assignee: UserRef,
    pub assigned_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub parent_id: Option<Uuid>,
    pub is_subtask: bool,
    /// Subtask count of the source node; zero for promoted subtasks.
    /// Non-zero means completion is gated.
    pub subtask_count: usize,
}

impl WorkItem {
    pub fn status(&self, today: NaiveDate) -> Status {
        classify(self.completed, self.deadline, today)
    }

    fn from_top_level(node: &TaskNode) -> Self {
        Self {
            id: node.id,
            title: node.title.clone(),
            description: node.description.clone(),
            deadline: node.deadline,
            completed: node.completed,
            priority: node.effective_priority(),
            tags: node.tags.clone(),
            assignee: node.assignee.clone(),
            assigned_by: node.creator.clone(),
            created_at: node.created_at,
            updated_at: node.updated_at,
            parent_id: node.parent_id,
            is_subtask: false,
            subtask_count: node.subtasks.len(),
        }
    }

    fn promoted(sub: &TaskNode, parent: &TaskNode) -> Self {
        Self {
            id: sub.id,
            title: sub.title.clone(),
            description: sub.description.clone(),
            deadline: sub.deadline,
            completed: sub.completed,
            priority: sub.priority.or(parent.priority).unwrap_or_default(),
            tags: if sub.tags.is_empty() {
                parent.tags.clone()
            } else {
                sub.tags.clone()
            },
            assignee: sub.assignee.clone(),
            assigned_by: parent.creator.clone(),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
            parent_id: Some(parent.id),
            is_subtask: true,
            // Flattening: a promoted subtask never re-exposes children.
            subtask_count: 0,
        }
    }
}

/// The two role-based views of one snapshot for one viewer.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub my_work: Vec<WorkItem>,
    pub assigned_by_me: Vec<WorkItem>,
}

/// Materializes both projections from a task snapshot. Pure over its
/// inputs; callers re-run it against a fresh snapshot after any store
/// mutation rather than patching incrementally.
pub fn materialize(tasks: &[TaskNode], viewer: &Viewer) -> Projection {
    let projection = Projection {
        my_work: materialize_my_work(tasks, viewer),
        assigned_by_me: materialize_assigned_by_me(tasks, viewer),
    };

    debug!(
        my_work = projection.my_work.len(),
        assigned_by_me = projection.assigned_by_me.len(),
        "materialized projections"
    );
    projection
}

fn materialize_my_work(tasks: &[TaskNode], viewer: &Viewer) -> Vec<WorkItem> {
    let mut items = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::new();

    // Top-level tasks assigned to the viewer come first.
    for node in tasks {
        if viewer.matches(&node.assignee) && seen.insert(node.id) {
            items.push(WorkItem::from_top_level(node));
        }
    }

    // Then subtasks assigned to the viewer inside tasks the viewer
    // neither authored nor owns, each promoted to an independent item.
    for node in tasks {
        if viewer.matches(&node.assignee) || viewer.matches(&node.creator) {
            continue;
        }
        for sub in &node.subtasks {
            if viewer.matches(&sub.assignee) && seen.insert(sub.id) {
                items.push(WorkItem::promoted(sub, node));
            }
        }
    }

    items
}

fn materialize_assigned_by_me(tasks: &[TaskNode], viewer: &Viewer) -> Vec<WorkItem> {
    let mut items = Vec::new();

    for node in tasks {
        if !viewer.matches(&node.creator) {
            continue;
        }

        if node.has_subtasks() {
            for sub in &node.subtasks {
                if !viewer.matches(&sub.assignee) {
                    items.push(WorkItem::promoted(sub, node));
                }
            }
        } else {
            items.push(WorkItem::from_top_level(node));
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::materialize;
    use crate::task::{Priority, TaskNode, UserRef, Viewer};

    fn node(title: &str, creator: &str, assignee: &str) -> TaskNode {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        TaskNode::new(title, UserRef::bare(assignee), UserRef::bare(creator), now)
    }

    #[test]
    fn assigned_subtask_is_promoted_but_parent_stays_hidden() {
        // Task C: created by u3, subtasks assigned to u1 and u2.
        let mut c = node("C", "u3", "u3");
        c.subtasks.push(node("C.1", "u3", "u1"));
        c.subtasks.push(node("C.2", "u3", "u2"));

        let u1 = Viewer::new("u1", "u1@example.com");
        let projection = materialize(&[c.clone()], &u1);

        assert_eq!(projection.my_work.len(), 1);
        let item = &projection.my_work[0];
        assert_eq!(item.title, "C.1");
        assert!(item.is_subtask);
        assert_eq!(item.parent_id, Some(c.id));
        assert_eq!(item.subtask_count, 0);
        assert_eq!(item.assigned_by, UserRef::bare("u3"));
        assert!(projection.assigned_by_me.is_empty());
    }

    #[test]
    fn promoted_subtask_inherits_priority_and_tags() {
        let mut parent = node("P", "u3", "u3");
        parent.priority = Some(Priority::Critical);
        parent.tags = vec!["ops".to_string()];
        parent.subtasks.push(node("P.1", "u3", "u1"));

        let mut own = node("P.2", "u3", "u1");
        own.priority = Some(Priority::Low);
        own.tags = vec!["own".to_string()];
        parent.subtasks.push(own);

        let u1 = Viewer::new("u1", "u1@example.com");
        let projection = materialize(&[parent], &u1);

        assert_eq!(projection.my_work[0].priority, Priority::Critical);
        assert_eq!(projection.my_work[0].tags, vec!["ops".to_string()]);
        assert_eq!(projection.my_work[1].priority, Priority::Low);
        assert_eq!(projection.my_work[1].tags, vec!["own".to_string()]);
    }

    #[test]
    fn assigned_by_me_splits_on_subtask_ownership() {
        // Without subtasks: the task itself appears. With subtasks:
        // only subtasks assigned to someone else appear.
        let plain = node("plain", "u1", "u2");
        let mut owner = node("owner", "u1", "u1");
        owner.subtasks.push(node("mine", "u1", "u1"));
        owner.subtasks.push(node("theirs", "u1", "u2"));

        let u1 = Viewer::new("u1", "u1@example.com");
        let projection = materialize(&[plain, owner], &u1);

        let titles: Vec<&str> = projection
            .assigned_by_me
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["plain", "theirs"]);
        assert!(projection.assigned_by_me[1].is_subtask);
    }

    #[test]
    fn my_work_deduplicates_by_id() {
        let task = node("T", "u2", "u1");
        let u1 = Viewer::new("u1", "u1@example.com");

        let projection = materialize(&[task.clone(), task], &u1);
        assert_eq!(projection.my_work.len(), 1);
    }

    #[test]
    fn disjoint_unless_authored_and_self_assigned() {
        let self_assigned = node("self", "u1", "u1");
        let other = node("other", "u2", "u1");

        let u1 = Viewer::new("u1", "u1@example.com");
        let projection = materialize(&[self_assigned.clone(), other], &u1);

        let my_ids: Vec<_> = projection.my_work.iter().map(|i| i.id).collect();
        let assigned_ids: Vec<_> =
            projection.assigned_by_me.iter().map(|i| i.id).collect();

        // The authored-and-self-assigned task is the only overlap.
        let overlap: Vec<_> = my_ids
            .iter()
            .filter(|id| assigned_ids.contains(id))
            .collect();
        assert_eq!(overlap, vec![&self_assigned.id]);
    }

    #[test]
    fn promoted_items_never_expose_children() {
        let mut parent = node("P", "u3", "u3");
        parent.subtasks.push(node("P.1", "u3", "u1"));

        let u1 = Viewer::new("u1", "u1@example.com");
        let projection = materialize(&[parent], &u1);

        for item in projection
            .my_work
            .iter()
            .chain(projection.assigned_by_me.iter())
        {
            if item.is_subtask {
                assert_eq!(item.subtask_count, 0);
            }
        }
    }
}
