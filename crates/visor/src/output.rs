//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`
//! for lists and the shared view-model lines for single payloads, so the
//! CLI prints exactly what the dashboard shows.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// `label: state` with the state green when healthy and red otherwise.
pub fn indicator(label: &str, state: &str, up: bool, color: bool) -> String {
    let word = if up { state } else { "Down" };
    if !color {
        return format!("{label}: {word}");
    }
    if up {
        format!("{label}: {}", word.green())
    } else {
        format!("{label}: {}", word.red())
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable payload in the chosen format.
///
/// Table and plain rendering both print the view-model lines from
/// `lines_fn`; structured formats serialize the payload itself.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    lines_fn: impl Fn(&T) -> Vec<String>,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => lines_fn(data).join("\n"),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    #[test]
    fn plain_list_is_one_line_per_item() {
        let items = [Item { name: "a" }, Item { name: "b" }];
        let out = render_list(
            &OutputFormat::Plain,
            &items,
            |i| Row { name: i.name },
            |i| i.name.to_owned(),
        );
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn table_has_header() {
        let items = [Item { name: "a" }];
        let out = render_list(&OutputFormat::Table, &items, |i| Row { name: i.name }, |i| {
            i.name.to_owned()
        });
        assert!(out.contains("Name"));
    }

    #[test]
    fn single_json_serializes_payload() {
        let out = render_single(&OutputFormat::JsonCompact, &Item { name: "a" }, |_| {
            vec!["ignored".into()]
        });
        assert_eq!(out, r#"{"name":"a"}"#);
    }

    #[test]
    fn indicator_without_color() {
        assert_eq!(indicator("Camera", "Ready", true, false), "Camera: Ready");
        assert_eq!(indicator("Camera", "Ready", false, false), "Camera: Down");
    }
}
