//! Terminal UI helpers: tables, spinners, and selection prompts.

use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{InquireError, Select};
use std::cmp;
use std::fmt::Display;
use std::time::Duration;

/// Auto-sizing table with box-drawing borders, shrunk to the terminal width.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        if self.headers.is_empty() {
            return;
        }
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], console::measure_text_width(&flatten(cell)));
            }
        }

        // indent + borders + padding
        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        // Shave the widest column until it fits; never below 8.
        while widths.iter().sum::<usize>() > budget {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        let widths = self.column_widths(max_width);
        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let row_line = |cells: &[String], bold: bool| {
            let mut line = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let cut = console::truncate_str(&flatten(cell), *width, "...").to_string();
                let pad = width.saturating_sub(console::measure_text_width(&cut));
                let cell = if bold { cut.bold().to_string() } else { cut };
                line.push_str(&format!(" {}{} │", cell, " ".repeat(pad)));
            }
            line
        };

        let mut lines = vec![border("┌", "┬", "┐"), row_line(self.headers.as_slice(), true)];
        lines.push(border("├", "┼", "┤"));
        for row in &self.rows {
            lines.push(row_line(row.as_slice(), false));
        }
        lines.push(border("└", "┴", "┘"));
        lines
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            _ => c,
        })
        .collect()
}

/// Spinner shown while a slow `arduino-cli` listing runs.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Filterable single-choice prompt. `Ok(None)` when the user cancels.
pub fn pick<T: Display>(message: &str, options: Vec<T>, starting: usize) -> Result<Option<T>> {
    let starting = starting.min(options.len().saturating_sub(1));
    match Select::new(message, options)
        .with_page_size(15)
        .with_starting_cursor(starting)
        .prompt()
    {
        Ok(choice) => Ok(Some(choice)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            println!("{} Cancelled.", "!".yellow());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_with_wrong_arity_are_dropped() {
        let mut table = Table::new(&["Name", "Value"]);
        table.add_row(vec!["only one".to_string()]);
        assert!(table.is_empty());
        table.add_row(vec!["board".to_string(), "arduino:avr:uno".to_string()]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_render_fits_content() {
        let mut table = Table::new(&["Key", "Value"]);
        table.add_row(vec!["port".to_string(), "COM3".to_string()]);
        let lines = table.render(80);
        assert_eq!(lines.len(), 5);
        assert!(lines[3].contains("COM3"));
        let widths: Vec<usize> = lines
            .iter()
            .map(|l| console::measure_text_width(l))
            .collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn test_render_truncates_to_terminal() {
        let mut table = Table::new(&["Name", "Description"]);
        table.add_row(vec!["x".to_string(), "d".repeat(200)]);
        let lines = table.render(60);
        assert!(lines[3].contains("..."));
        assert!(console::measure_text_width(&lines[3]) <= 60);
    }
}
