//! Shared color palette for the TUI.

use ratatui::style::Color;

// ── Node kinds ──────────────────────────────────────────────────────
pub const KIND_AGENT: Color = Color::Rgb(255, 180, 50);
pub const KIND_SESSION: Color = Color::Rgb(80, 140, 255);
pub const KIND_ACTION: Color = Color::Rgb(80, 220, 120);

// ── Secondary text ──────────────────────────────────────────────────
pub const DETAIL: Color = Color::Rgb(120, 120, 120);
pub const ERROR: Color = Color::Rgb(220, 80, 80);

// ── Accent / chrome ─────────────────────────────────────────────────
pub const ACCENT_MUTED: Color = Color::Rgb(120, 120, 180);
pub const HIGHLIGHT_BG: Color = Color::Rgb(60, 55, 50);
pub const HIGHLIGHT_FG: Color = Color::Rgb(255, 220, 150);
