use std::path::Path;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::cli::{Command, ListArgs};
use crate::filter::{ItemFilter, PriorityFilter, StatusFilter};
use crate::merge::merge_assignments;
use crate::permissions::{self, GATING_REJECTION};
use crate::projection::{WorkItem, materialize};
use crate::render::Renderer;
use crate::snapshot::{SnapshotStore, load_drafts, load_suggestion, save_drafts_atomic};
use crate::sort::{QueryParams, SortKey, filter_and_sort};
use crate::task::Viewer;

#[instrument(skip(store, renderer, command, viewer))]
pub fn dispatch(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    command: Command,
    viewer: &Viewer,
    today: NaiveDate,
) -> anyhow::Result<()> {
    debug!(?command, viewer = %viewer.id, %today, "dispatching command");

    match command {
        Command::Mine(args) => cmd_list(store, renderer, viewer, today, &args, View::Mine),
        Command::Assigned(args) => {
            cmd_list(store, renderer, viewer, today, &args, View::Assigned)
        }
        Command::Info { id } => cmd_info(store, renderer, viewer, today, &id),
        Command::Merge { drafts, suggestion } => cmd_merge(&drafts, &suggestion),
    }
}

#[derive(Debug, Clone, Copy)]
enum View {
    Mine,
    Assigned,
}

#[instrument(skip(store, renderer, viewer, args))]
fn cmd_list(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    viewer: &Viewer,
    today: NaiveDate,
    args: &ListArgs,
    view: View,
) -> anyhow::Result<()> {
    info!(?view, "command list");

    let snapshot = store.load()?;
    let projection = materialize(&snapshot.top_level_tasks, viewer);

    let items = match view {
        View::Mine => projection.my_work,
        View::Assigned => projection.assigned_by_me,
    };

    let params = query_params(args);
    let items = filter_and_sort(&items, &params, today);

    renderer.print_item_table(&items, today)?;
    println!("{} item(s).", items.len());
    Ok(())
}

#[instrument(skip(store, renderer, viewer))]
fn cmd_info(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    viewer: &Viewer,
    today: NaiveDate,
    id: &str,
) -> anyhow::Result<()> {
    info!("command info");

    let snapshot = store.load()?;
    let projection = materialize(&snapshot.top_level_tasks, viewer);

    // An item found through the assigned-by-me view is rendered in a
    // context where the viewer is already known to be privileged.
    let (item, force_allow) = find_item(&projection.my_work, id)
        .map(|item| (item, false))
        .or_else(|| find_item(&projection.assigned_by_me, id).map(|item| (item, true)))
        .ok_or_else(|| anyhow!("no item matching id: {id}"))?;

    let caps = permissions::resolve_item(item, viewer, force_allow);
    renderer.print_item_info(item, today, &caps)?;

    if item.subtask_count > 0 && viewer.matches(&item.assignee) {
        println!("note: {GATING_REJECTION}");
    }
    Ok(())
}

#[instrument(skip(drafts_path, suggestion_path))]
fn cmd_merge(drafts_path: &Path, suggestion_path: &Path) -> anyhow::Result<()> {
    info!("command merge");

    let mut drafts = load_drafts(drafts_path)?;
    let suggestion = load_suggestion(suggestion_path)?;

    let merged = merge_assignments(&mut drafts, &suggestion);
    save_drafts_atomic(drafts_path, &drafts)?;

    println!("Assigned {merged} subtask(s).");
    Ok(())
}

fn query_params(args: &ListArgs) -> QueryParams {
    QueryParams {
        filter: ItemFilter {
            search: args.search.clone(),
            status: StatusFilter::parse(&args.status),
            priority: PriorityFilter::parse(&args.priority),
        },
        sort_by: SortKey::parse(&args.sort),
    }
}

fn find_item<'a>(items: &'a [WorkItem], id: &str) -> Option<&'a WorkItem> {
    let needle = id.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|item| item.id.to_string().starts_with(&needle))
}
