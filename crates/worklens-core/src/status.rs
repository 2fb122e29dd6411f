use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Derived state of a work item for a given calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Completed,
    Overdue,
    DueToday,
    Pending,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::DueToday => "due-today",
            Self::Pending => "pending",
        }
    }
}

/// Classifies one item against a caller-supplied `today`. Total and
/// pure: completion wins regardless of date, and an absent deadline is
/// never overdue. Dates are already midnight-normalized (`NaiveDate`
/// carries no time of day).
pub fn classify(completed: bool, deadline: Option<NaiveDate>, today: NaiveDate) -> Status {
    if completed {
        return Status::Completed;
    }

    match deadline {
        Some(date) if date < today => Status::Overdue,
        Some(date) if date == today => Status::DueToday,
        _ => Status::Pending,
    }
}
