//! Neon palette and semantic styling for the dashboard.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Plain panel text.
pub fn body() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Secondary text such as timestamps and empty-state messages.
pub fn muted() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn tab_active() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// A highlighted result, e.g. the best match or an active alert.
pub fn emphasis() -> Style {
    Style::default().fg(CORAL).add_modifier(Modifier::BOLD)
}

/// Color for a panel status word: ready and done states green, in-flight
/// yellow, idle gray, anything else is a failure code.
pub fn status_color(status: &str) -> Color {
    match status {
        "ready" | "uploaded" | "registered" | "matched" | "done" | "success" | "live" => {
            SUCCESS_GREEN
        }
        "loading" | "capturing" | "registering" | "recognizing" | "analyzing" | "scanning"
        | "connecting" | "reconnecting" => ELECTRIC_YELLOW,
        "idle" => BORDER_GRAY,
        "unknown" | "no_match" => CORAL,
        _ => ERROR_RED,
    }
}

pub fn status_style(status: &str) -> Style {
    Style::default().fg(status_color(status))
}
