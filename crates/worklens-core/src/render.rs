use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::permissions::Capabilities;
use crate::projection::WorkItem;
use crate::status::Status;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, items, today))]
    pub fn print_item_table(
        &mut self,
        items: &[WorkItem],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Due".to_string(),
            "Pri".to_string(),
            "By".to_string(),
            "Title".to_string(),
            "Tags".to_string(),
        ];

        let mut rows = Vec::with_capacity(items.len());

        for item in items {
            let status = item.status(today);
            let id = self.paint(&short_id(item), "33");

            let due = item
                .deadline
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let due = match status {
                Status::Overdue => self.paint(&due, "31"),
                Status::DueToday => self.paint(&due, "33"),
                _ => due,
            };

            let tags = item
                .tags
                .iter()
                .map(|tag| format!("+{tag}"))
                .collect::<Vec<_>>()
                .join(" ");

            let title = if item.is_subtask {
                format!("\u{21b3} {}", item.title)
            } else {
                item.title.clone()
            };

            rows.push(vec![
                id,
                status.label().to_string(),
                due,
                item.priority.label().to_string(),
                item.assigned_by.display().to_string(),
                title,
                tags,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, item, caps))]
    pub fn print_item_info(
        &mut self,
        item: &WorkItem,
        today: NaiveDate,
        caps: &Capabilities,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id          {}", item.id)?;
        writeln!(out, "title       {}", item.title)?;
        if let Some(description) = &item.description {
            writeln!(out, "description {description}")?;
        }
        writeln!(out, "status      {}", item.status(today).label())?;
        writeln!(out, "priority    {}", item.priority.label())?;
        if let Some(deadline) = item.deadline {
            writeln!(out, "deadline    {}", deadline.format("%Y-%m-%d"))?;
        }
        writeln!(out, "assignee    {}", item.assignee.display())?;
        writeln!(out, "assigned by {}", item.assigned_by.display())?;
        if let Some(parent_id) = item.parent_id {
            writeln!(out, "parent      {parent_id}")?;
        }
        if item.subtask_count > 0 {
            writeln!(out, "subtasks    {}", item.subtask_count)?;
        }
        writeln!(out, "tags        {}", item.tags.join(", "))?;
        writeln!(out, "created     {}", item.created_at.format("%Y-%m-%dT%H:%M:%SZ"))?;
        writeln!(out, "updated     {}", item.updated_at.format("%Y-%m-%dT%H:%M:%SZ"))?;
        writeln!(out, "can edit    {}", caps.can_edit_or_delete)?;
        writeln!(out, "can toggle  {}", caps.can_toggle_completion)?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short_id(item: &WorkItem) -> String {
    item.id.to_string().chars().take(8).collect()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
