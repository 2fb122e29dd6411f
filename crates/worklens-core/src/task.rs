use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task priority. Variant order doubles as the comparison rank:
/// critical > high > medium > low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Lenient parse: unknown spellings fall back to `Medium`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Reference to a user. The store serializes this either as a bare id
/// string or as a populated object; deserialization normalizes both
/// forms so nothing downstream ever branches on the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserRefWire")]
pub struct UserRef {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl UserRef {
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
        }
    }

    pub fn display(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefWire {
    Bare(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<UserRefWire> for UserRef {
    fn from(wire: UserRefWire) -> Self {
        match wire {
            UserRefWire::Bare(id) => UserRef::bare(id),
            UserRefWire::Populated { id, email, name } => UserRef { id, email, name },
        }
    }
}

/// The identity the engine is materializing for. Supplied by the
/// caller; the engine never resolves identity itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: String,
    pub email: String,
}

impl Viewer {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }

    /// Identity match against a user reference: case-insensitive,
    /// trimmed, over both id and email on either side.
    pub fn matches(&self, user: &UserRef) -> bool {
        let mine = [norm(&self.id), norm(&self.email)];
        let theirs = [
            Some(norm(&user.id)),
            user.email.as_deref().map(norm),
        ];

        mine.iter()
            .filter(|side| !side.is_empty())
            .any(|side| theirs.iter().flatten().any(|other| other == side))
    }
}

fn norm(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// One unit of work. Top-level tasks may own one level of subtasks;
/// a subtask never owns subtasks of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, with = "lenient_date_serde")]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,

    pub assignee: UserRef,

    pub creator: UserRef,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub subtasks: Vec<TaskNode>,

    #[serde(default, deserialize_with = "lenient_parent_id")]
    pub parent_id: Option<Uuid>,
}

impl TaskNode {
    pub fn new(
        title: impl Into<String>,
        assignee: UserRef,
        creator: UserRef,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            deadline: None,
            completed: false,
            priority: None,
            assignee,
            creator,
            tags: vec![],
            created_at: now,
            updated_at: now,
            subtasks: vec![],
            parent_id: None,
        }
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }

    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// Enforces the depth-two invariant: any subtask found carrying its
    /// own subtasks has them discarded, and every subtask gets its
    /// `parent_id` stamped. Returns the number of discarded grandchildren.
    pub fn enforce_depth(&mut self) -> usize {
        let parent = self.id;
        let mut discarded = 0;
        for sub in &mut self.subtasks {
            discarded += sub.subtasks.len();
            sub.subtasks.clear();
            sub.parent_id = Some(parent);
        }
        discarded
    }
}

/// An in-progress subtask from the task authoring form, before it
/// becomes a `TaskNode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDraft {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// `parentId` arrives either as a bare id string or, when the store
/// populated the back-reference, as a full object. Both normalize to a
/// plain id so nothing downstream ever sees the object form.
fn lenient_parent_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ParentIdWire {
        Bare(Uuid),
        Populated {
            #[serde(alias = "_id")]
            id: Uuid,
        },
    }

    let raw = Option::<ParentIdWire>::deserialize(deserializer)?;
    Ok(raw.map(|wire| match wire {
        ParentIdWire::Bare(id) => id,
        ParentIdWire::Populated { id } => id,
    }))
}

/// Unknown priority spellings from the store fold into `Medium`
/// instead of failing the whole snapshot.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| Priority::parse(&s)))
}

/// Deadline dates arrive from the store either as plain `YYYY-MM-DD`
/// or as a full timestamp. Both normalize to a calendar date; values
/// that parse as neither are treated as absent rather than erroring.
pub mod lenient_date_serde {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(value) => {
                serializer.serialize_str(&value.format("%Y-%m-%d").to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let trimmed = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Some(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Some(dt.date_naive()));
        }

        tracing::warn!(raw = %trimmed, "unparseable deadline treated as absent");
        Ok(None)
    }
}
