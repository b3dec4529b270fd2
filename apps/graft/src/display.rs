//! Output rendering and formatting

use crate::report::{CacheReport, CommandOutput, Summary, TreeNode, UnitReport};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use graft_events::MetadataSourceKind;
use graft_types::{Message, Severity};
use std::io;
use std::path::PathBuf;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_text(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &CommandOutput) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    fn render_text(&self, result: &CommandOutput) -> io::Result<()> {
        match result {
            CommandOutput::Resolve { units, summary, .. } => {
                self.render_units(units)?;
                self.render_summary(summary)
            }
            CommandOutput::Tree { roots, summary } => {
                for root in roots {
                    self.render_tree(root, "", true, true)?;
                }
                self.render_summary(summary)
            }
            CommandOutput::Classpath { entries, .. } => self.render_classpath(entries),
            CommandOutput::Fetch {
                units,
                cache,
                summary,
            } => {
                self.render_files(units)?;
                self.render_cache(cache)?;
                self.render_summary(summary)
            }
        }
    }

    fn render_units(&self, units: &[UnitReport]) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Coordinate").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Dependencies").add_attribute(Attribute::Bold),
            Cell::new("Diagnostics").add_attribute(Attribute::Bold),
        ]);

        for unit in units {
            let source = match &unit.variant {
                Some(variant) => format!("{} ({variant})", source_label(unit.source)),
                None => source_label(unit.source).to_string(),
            };
            table.add_row(vec![
                Cell::new(&unit.coordinate),
                source_cell(unit.source, source),
                Cell::new(unit.dependencies.len()),
                messages_cell(&unit.messages),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    fn render_tree(&self, node: &TreeNode, prefix: &str, last: bool, root: bool) -> io::Result<()> {
        let branch = match (root, last) {
            (true, _) => "",
            (false, true) => "\\--- ",
            (false, false) => "+--- ",
        };
        let marker = if node.cycle {
            " (cycle)"
        } else if node.repeated {
            " (*)"
        } else if node.source == MetadataSourceKind::Unavailable {
            " (unavailable)"
        } else {
            ""
        };
        let style = if node.messages.iter().any(Message::is_error) {
            Style::new().red()
        } else if node.messages.is_empty() {
            Style::new()
        } else {
            Style::new().yellow()
        };
        self.term.write_line(&format!(
            "{prefix}{branch}{}{}",
            style.apply_to(&node.coordinate),
            Style::new().dim().apply_to(marker)
        ))?;

        let child_prefix = match (root, last) {
            (true, _) => prefix.to_string(),
            (false, true) => format!("{prefix}     "),
            (false, false) => format!("{prefix}|    "),
        };
        for (index, child) in node.children.iter().enumerate() {
            let last_child = index + 1 == node.children.len();
            self.render_tree(child, &child_prefix, last_child, false)?;
        }
        Ok(())
    }

    fn render_classpath(&self, entries: &[PathBuf]) -> io::Result<()> {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let joined = entries
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(separator);
        self.term.write_line(&joined)
    }

    fn render_files(&self, units: &[UnitReport]) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Coordinate").add_attribute(Attribute::Bold),
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
        ]);

        for unit in units {
            if unit.files.is_empty() {
                let status = if unit.messages.iter().any(Message::is_error) {
                    Cell::new("failed").fg(Color::Red)
                } else {
                    Cell::new("-")
                };
                table.add_row(vec![Cell::new(&unit.coordinate), status, Cell::new("")]);
                continue;
            }
            for (name, path) in &unit.files {
                table.add_row(vec![
                    Cell::new(&unit.coordinate),
                    Cell::new(name),
                    Cell::new(path.display()),
                ]);
            }
        }

        self.term.write_line(&table.to_string())
    }

    fn render_cache(&self, cache: &CacheReport) -> io::Result<()> {
        self.term.write_line(&format!(
            "Cache: {} reused, {} downloaded ({} bytes), {} failed",
            cache.hits, cache.downloads, cache.bytes_downloaded, cache.failures
        ))
    }

    fn render_summary(&self, summary: &Summary) -> io::Result<()> {
        let errors = if summary.errors > 0 {
            Style::new().red().bold()
        } else {
            Style::new().green()
        };
        let warnings = if summary.warnings > 0 {
            Style::new().yellow()
        } else {
            Style::new()
        };
        self.term.write_line(&format!(
            "{} units, {}, {}",
            summary.units,
            errors.apply_to(plural(summary.errors, "error")),
            warnings.apply_to(plural(summary.warnings, "warning"))
        ))
    }
}

fn source_label(source: MetadataSourceKind) -> &'static str {
    match source {
        MetadataSourceKind::Descriptor => "pom",
        MetadataSourceKind::ModuleMetadata => "module",
        MetadataSourceKind::Unavailable => "unavailable",
    }
}

fn source_cell(source: MetadataSourceKind, label: String) -> Cell {
    match source {
        MetadataSourceKind::Unavailable => Cell::new(label).fg(Color::Red),
        MetadataSourceKind::ModuleMetadata => Cell::new(label).fg(Color::Cyan),
        MetadataSourceKind::Descriptor => Cell::new(label),
    }
}

fn messages_cell(messages: &[Message]) -> Cell {
    if messages.is_empty() {
        return Cell::new("-");
    }
    let text = messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    let color = if messages.iter().any(|m| m.severity == Severity::Error) {
        Color::Red
    } else {
        Color::Yellow
    };
    Cell::new(text).fg(color)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plural_counts() {
        assert_eq!(plural(0, "error"), "0 errors");
        assert_eq!(plural(1, "warning"), "1 warning");
        assert_eq!(plural(3, "warning"), "3 warnings");
    }

    #[test]
    fn messages_cell_lists_each_message() {
        let cell = messages_cell(&[
            Message::warning("several variants match, none selected"),
            Message::error("descriptor could not be parsed").with_detail("line 3"),
        ]);
        let content = cell.content();
        assert!(content.contains("warning: several variants match"));
        assert!(content.contains("error: descriptor could not be parsed (line 3)"));
    }
}
