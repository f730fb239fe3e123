//! Column-aligned text tables.

use super::text::{pad, truncate, visible_len};
use crossterm::style::Stylize;

/// A table of text cells rendered with aligned columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Column truncated first when the table is too wide.
    flex: Option<usize>,
}

impl Table {
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Mark the column that absorbs width limits.
    #[must_use]
    pub fn flex(mut self, column: usize) -> Self {
        self.flex = Some(column);
        self
    }

    /// Append a row, padding or cutting it to the header count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self, max_width: Option<usize>) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_len(h)).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(visible_len(cell));
            }
        }

        if let (Some(limit), Some(flex)) = (max_width, self.flex) {
            let separators = 2 * widths.len().saturating_sub(1);
            let total: usize = widths.iter().sum::<usize>() + separators;
            if total > limit {
                let others = total - widths[flex];
                let floor = visible_len(&self.headers[flex]).max(10);
                widths[flex] = limit.saturating_sub(others).max(floor);
            }
        }
        widths
    }

    /// Render with a header rule; `bold` styles the header line.
    #[must_use]
    pub fn render(&self, max_width: Option<usize>, bold: bool) -> String {
        let widths = self.widths(max_width);
        let line = |cells: &[String]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(&truncate(cell, *width), *width))
                .collect();
            padded.join("  ").trim_end().to_string()
        };

        let mut out = String::new();
        let header = line(&self.headers);
        if bold {
            out.push_str(&header.as_str().bold().to_string());
        } else {
            out.push_str(&header);
        }
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("  "));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}
