use chrono::NaiveDate;
use tracing::trace;

use crate::projection::WorkItem;
use crate::status::Status;
use crate::task::Priority;

/// Status facet. The `"all"` spelling intentionally means "all active"
/// (non-completed), matching the dashboard this engine serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Active,
    Completed,
    Pending,
    Overdue,
}

impl StatusFilter {
    /// Lenient parse: unknown spellings fall back to the `all` bucket.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "pending" => Self::Pending,
            "overdue" => Self::Overdue,
            _ => Self::Active,
        }
    }

    fn matches(self, item: &WorkItem, today: NaiveDate) -> bool {
        match self {
            Self::Active => !item.completed,
            Self::Completed => item.completed,
            Self::Pending => !item.completed && item.status(today) != Status::Overdue,
            Self::Overdue => item.status(today) == Status::Overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Exact(Priority),
}

impl PriorityFilter {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Exact(Priority::Critical),
            "high" => Self::Exact(Priority::High),
            "medium" => Self::Exact(Priority::Medium),
            "low" => Self::Exact(Priority::Low),
            _ => Self::All,
        }
    }

    fn matches(self, item: &WorkItem) -> bool {
        match self {
            Self::All => true,
            Self::Exact(priority) => item.priority == priority,
        }
    }
}

/// Text search plus status and priority facets, AND-composed.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub search: String,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl ItemFilter {
    pub fn matches(&self, item: &WorkItem, today: NaiveDate) -> bool {
        let ok = self.search_matches(item)
            && self.status.matches(item, today)
            && self.priority.matches(item);

        trace!(id = %item.id, ok, "item filter evaluation");
        ok
    }

    fn search_matches(&self, item: &WorkItem) -> bool {
        let query = self.search.trim().to_ascii_lowercase();
        if query.is_empty() {
            return true;
        }

        item.title.to_ascii_lowercase().contains(&query)
            || item
                .description
                .as_deref()
                .is_some_and(|text| text.to_ascii_lowercase().contains(&query))
    }
}

pub fn apply(items: &[WorkItem], filter: &ItemFilter, today: NaiveDate) -> Vec<WorkItem> {
    items
        .iter()
        .filter(|item| filter.matches(item, today))
        .cloned()
        .collect()
}
