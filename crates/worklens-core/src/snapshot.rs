use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::merge::SuggestionResult;
use crate::task::{SubtaskDraft, TaskNode};

/// One snapshot from the external task store: the full collection of
/// top-level tasks with embedded subtasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub top_level_tasks: Vec<TaskNode>,
}

/// Read-side adapter over the store's serialized snapshot. The engine
/// never writes tasks back; mutations belong to the external store.
#[derive(Debug)]
pub struct SnapshotStore {
    pub path: PathBuf,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Self {
        debug!(snapshot = %path.display(), "using snapshot file");
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Loads and normalizes a snapshot. Normalization enforces the
    /// depth-two invariant before anything downstream sees the tree.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Snapshot> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read snapshot {}", self.path.display()))?;

        let mut snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", self.path.display()))?;

        let mut discarded = 0;
        for task in &mut snapshot.top_level_tasks {
            discarded += task.enforce_depth();
        }
        if discarded > 0 {
            warn!(discarded, "discarded nested subtasks beyond depth two");
        }

        let untitled = drop_untitled(&mut snapshot.top_level_tasks);
        if untitled > 0 {
            warn!(untitled, "dropped nodes with empty titles");
        }

        info!(
            tasks = snapshot.top_level_tasks.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

/// A node's title is required to be non-empty text; nodes violating
/// that are dropped rather than flowing blank through projection.
fn drop_untitled(tasks: &mut Vec<TaskNode>) -> usize {
    let mut dropped = 0;

    tasks.retain(|task| {
        let keep = !task.title.trim().is_empty();
        if !keep {
            warn!(id = %task.id, "dropping untitled task");
            dropped += 1;
        }
        keep
    });

    for task in tasks {
        task.subtasks.retain(|sub| {
            let keep = !sub.title.trim().is_empty();
            if !keep {
                warn!(id = %sub.id, parent = %task.id, "dropping untitled subtask");
                dropped += 1;
            }
            keep
        });
    }

    dropped
}

#[tracing::instrument(skip(path))]
pub fn load_drafts(path: &Path) -> anyhow::Result<Vec<SubtaskDraft>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read drafts {}", path.display()))?;
    let drafts: Vec<SubtaskDraft> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse drafts {}", path.display()))?;
    debug!(count = drafts.len(), "loaded subtask drafts");
    Ok(drafts)
}

#[tracing::instrument(skip(path))]
pub fn load_suggestion(path: &Path) -> anyhow::Result<SuggestionResult> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read suggestion {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse suggestion {}", path.display()))
}

/// Writes a draft list back atomically: serialize to a temp file in the
/// same directory, then persist over the target.
#[tracing::instrument(skip(path, drafts))]
pub fn save_drafts_atomic(path: &Path, drafts: &[SubtaskDraft]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = drafts.len(), "saving drafts atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string_pretty(drafts)?;
    writeln!(temp, "{serialized}")?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
