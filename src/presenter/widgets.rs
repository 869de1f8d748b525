//! Terminal building blocks: toned text, bars and aligned tables.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Neutral,
    Good,
    Bad,
    Muted,
}

/// Applies `tone` to `text` when colour output is enabled.
pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match tone {
        Tone::Plain => text.to_string(),
        Tone::Neutral => text.blue().to_string(),
        Tone::Good => text.green().bold().to_string(),
        Tone::Bad => text.red().bold().to_string(),
        Tone::Muted => text.dimmed().italic().to_string(),
    }
}

/// Formats `value` with `,` thousands separators and `decimals` places.
pub fn thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// A horizontal bar scaled so that `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

/// A plain-text table with right-aligned numeric columns.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    numeric: Vec<bool>,
    rows: Vec<(Vec<String>, Tone)>,
}

impl Table {
    /// Headers prefixed with `>` are right-aligned.
    pub fn new(headers: &[&str]) -> Self {
        Table {
            headers: headers
                .iter()
                .map(|h| h.trim_start_matches('>').to_string())
                .collect(),
            numeric: headers.iter().map(|h| h.starts_with('>')).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.push_toned(row, Tone::Plain);
    }

    pub fn push_toned(&mut self, row: Vec<String>, tone: Tone) {
        self.rows.push((row, tone));
    }

    pub fn render(&self, color: bool) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for (row, _) in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    if self.numeric[i] {
                        format!("{cell:>w$}")
                    } else {
                        format!("{cell:<w$}")
                    }
                })
                .collect();
            format!("  {}", padded.join("  ").trim_end())
        };

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(paint(&line(&self.headers), Tone::Neutral, color));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push(line(&rule));
        for (row, tone) in &self.rows {
            out.push(paint(&line(row), *tone, color));
        }
        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0, 0), "0");
        assert_eq!(thousands(999.0, 0), "999");
        assert_eq!(thousands(1234.0, 0), "1,234");
        assert_eq!(thousands(1234567.891, 1), "1,234,567.9");
        assert_eq!(thousands(-2500.5, 2), "-2,500.50");
        assert_eq!(thousands(-0.0001, 1), "0.0");
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(50.0, 100.0, 10), "█████");
        assert_eq!(bar(100.0, 100.0, 10), "██████████");
        assert_eq!(bar(0.1, 100.0, 10), "█");
        assert_eq!(bar(0.0, 100.0, 10), "");
        assert_eq!(bar(10.0, 0.0, 10), "");
    }

    #[test]
    fn test_paint_without_color_is_identity() {
        assert_eq!(paint("late", Tone::Bad, false), "late");
    }

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(&["Asset", ">Km"]);
        table.push(vec!["A1".into(), "50".into()]);
        table.push(vec!["LONG-ID".into(), "1,250".into()]);
        let rendered = table.render(false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "  Asset       Km");
        assert_eq!(lines[1], "  -------  -----");
        assert_eq!(lines[2], "  A1          50");
        assert_eq!(lines[3], "  LONG-ID  1,250");
    }
}
