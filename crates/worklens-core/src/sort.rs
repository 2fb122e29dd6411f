use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::filter::{self, ItemFilter};
use crate::projection::WorkItem;
use crate::status::Status;

/// Caller-selected final tie-break key. The leading keys (overdue
/// precedence, priority, completion) are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    DeadlineAsc,
    PriorityDesc,
    #[default]
    CreatedAtDesc,
}

impl SortKey {
    /// Lenient parse: unknown spellings fall back to the default key.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "deadline" | "deadlineasc" | "deadline-asc" => Self::DeadlineAsc,
            "priority" | "prioritydesc" | "priority-desc" => Self::PriorityDesc,
            _ => Self::CreatedAtDesc,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub filter: ItemFilter,
    pub sort_by: SortKey,
}

pub fn compare(a: &WorkItem, b: &WorkItem, key: SortKey, today: NaiveDate) -> Ordering {
    overdue_rank(a, today)
        .cmp(&overdue_rank(b, today))
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.completed.cmp(&b.completed))
        .then_with(|| match key {
            SortKey::DeadlineAsc => cmp_optional(a.deadline.as_ref(), b.deadline.as_ref()),
            // Priority was already applied above; acts as a stable no-op.
            SortKey::PriorityDesc => Ordering::Equal,
            SortKey::CreatedAtDesc => b.created_at.cmp(&a.created_at),
        })
}

/// Stable in-place sort; equal-ranked items retain input order.
pub fn sort(items: &mut [WorkItem], key: SortKey, today: NaiveDate) {
    items.sort_by(|a, b| compare(a, b, key, today));
}

/// The combined query entry point: filter, then order.
pub fn filter_and_sort(
    items: &[WorkItem],
    params: &QueryParams,
    today: NaiveDate,
) -> Vec<WorkItem> {
    let mut out = filter::apply(items, &params.filter, today);
    sort(&mut out, params.sort_by, today);
    out
}

fn overdue_rank(item: &WorkItem, today: NaiveDate) -> u8 {
    // `classify` already folds completion in, so a completed late item
    // does not get overdue precedence.
    if item.status(today) == Status::Overdue { 0 } else { 1 }
}

fn cmp_optional<T: Ord>(left: Option<&T>, right: Option<&T>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(b),
        // An absent deadline sorts as maximally distant.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{QueryParams, SortKey, filter_and_sort, sort};
    use crate::projection::{WorkItem, materialize};
    use crate::task::{Priority, TaskNode, UserRef, Viewer};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")
    }

    fn item(title: &str) -> WorkItem {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let u1 = UserRef::bare("u1");
        let task = TaskNode::new(title, u1.clone(), u1, now);
        let viewer = Viewer::new("u1", "u1@example.com");
        materialize(&[task], &viewer).my_work.remove(0)
    }

    #[test]
    fn overdue_precedence_beats_priority() {
        // A: deadline yesterday, medium. B: deadline today, critical.
        let mut a = item("A");
        a.deadline = NaiveDate::from_ymd_opt(2026, 3, 9);
        a.priority = Priority::Medium;

        let mut b = item("B");
        b.deadline = Some(today());
        b.priority = Priority::Critical;

        let mut items = vec![b, a];
        sort(&mut items, SortKey::default(), today());

        assert_eq!(items[0].title, "A");
        assert_eq!(items[1].title, "B");
    }

    #[test]
    fn completed_items_sort_after_open_ones() {
        let mut done = item("done");
        done.completed = true;
        let open = item("open");

        let mut items = vec![done, open];
        sort(&mut items, SortKey::default(), today());
        assert_eq!(items[0].title, "open");
    }

    #[test]
    fn deadline_asc_puts_missing_deadlines_last() {
        let mut near = item("near");
        near.deadline = NaiveDate::from_ymd_opt(2026, 3, 11);
        let mut far = item("far");
        far.deadline = NaiveDate::from_ymd_opt(2026, 4, 1);
        let undated = item("undated");

        let mut items = vec![undated, far, near];
        sort(&mut items, SortKey::DeadlineAsc, today());

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["near", "far", "undated"]);
    }

    #[test]
    fn created_at_desc_is_the_default_tie_break() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut older = item("older");
        older.created_at = now - Duration::days(2);
        let mut newer = item("newer");
        newer.created_at = now;

        let mut items = vec![older, newer];
        sort(&mut items, SortKey::default(), today());
        assert_eq!(items[0].title, "newer");
    }

    #[test]
    fn sort_is_stable_for_equal_ranks() {
        // Same priority, same completion, PriorityDesc tie-break is a
        // no-op, so input order must survive.
        let first = item("first");
        let second = item("second");
        let third = item("third");

        let mut items = vec![first, second, third];
        sort(&mut items, SortKey::PriorityDesc, today());

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);

        // And sorting again yields the identical ordering.
        let mut again = items.clone();
        sort(&mut again, SortKey::PriorityDesc, today());
        let again_titles: Vec<&str> = again.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, again_titles);
    }

    #[test]
    fn filter_and_sort_composes() {
        let mut late = item("late");
        late.deadline = NaiveDate::from_ymd_opt(2026, 3, 1);
        let mut done = item("done");
        done.completed = true;
        let open = item("open");

        let out = filter_and_sort(&[done, open, late], &QueryParams::default(), today());
        let titles: Vec<&str> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["late", "open"]);
    }
}
