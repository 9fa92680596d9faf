use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::i18n::Translator;
use crate::store::CountSummary;
use crate::task::Task;

/// Terminal renderer: task table plus the localized counts line, or the
/// localized empty-state message when the view has nothing to show.
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

    #[tracing::instrument(skip(self, view, translator))]
    pub fn print_list(
        &mut self,
        view: &[&Task],
        counts: CountSummary,
        collection_is_empty: bool,
        translator: &Translator,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if view.is_empty() {
            self.print_empty_state(&mut out, counts, collection_is_empty, translator)?;
        } else {
            self.print_table(&mut out, view)?;
        }

        writeln!(out, "{}", counts_line(counts, translator))?;
        Ok(())
    }

    fn print_table<W: Write>(&self, mut out: W, view: &[&Task]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            String::new(),
            "Created".to_string(),
            "Task".to_string(),
        ];

        let mut rows = Vec::with_capacity(view.len());
        for task in view {
            let id = self.paint(&task.id.to_string(), "33");
            let check = if task.completed {
                self.paint("x", "32")
            } else {
                " ".to_string()
            };
            let created = task
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string();
            let text = if task.completed {
                self.paint(&task.text, "9")
            } else {
                task.text.clone()
            };

            rows.push(vec![id, check, created, text]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn print_empty_state<W: Write>(
        &self,
        mut out: W,
        counts: CountSummary,
        collection_is_empty: bool,
        translator: &Translator,
    ) -> anyhow::Result<()> {
        let message = if collection_is_empty {
            format!(
                "{}\n{}",
                translator.resolve("emptyStateNoTasks"),
                translator.resolve("emptyStateHelper")
            )
        } else {
            match counts {
                CountSummary::Active { .. } => translator.resolve("emptyStateNoActive"),
                CountSummary::Completed { .. } => translator.resolve("emptyStateNoCompleted"),
                CountSummary::All { .. } => translator.resolve("emptyStateNoTasks"),
            }
        };

        writeln!(out, "{message}")?;
        Ok(())
    }

    /// Small stand-in for the celebratory effect on task completion.
    pub fn celebrate(&self) -> anyhow::Result<()> {
        println!("{}", self.paint("*** \u{1f389} ***", "35"));
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn counts_line(counts: CountSummary, translator: &Translator) -> String {
    match counts {
        CountSummary::All { active, total } => translator.resolve_with(
            "taskCountAll",
            &[("active", active.to_string()), ("total", total.to_string())],
        ),
        CountSummary::Active { count } => {
            translator.resolve_with("taskCountActive", &[("count", count.to_string())])
        }
        CountSummary::Completed { count } => {
            translator.resolve_with("taskCountCompleted", &[("count", count.to_string())])
        }
    }
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
