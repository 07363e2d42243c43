//! Two disjoint renderings of the same data: a Catppuccin-style dark
//! palette and an LCARS-style one. Controllers and screens stay data-only;
//! every color goes through this module, and the active palette is
//! switchable at runtime (`t` key, persisted in the prefs file).

use std::sync::atomic::{AtomicU8, Ordering};

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Catppuccin,
    Lcars,
}

impl ThemeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Catppuccin => "catppuccin",
            Self::Lcars => "lcars",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "lcars" => Self::Lcars,
            _ => Self::Catppuccin,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Catppuccin => Self::Lcars,
            Self::Lcars => Self::Catppuccin,
        }
    }
}

static ACTIVE: AtomicU8 = AtomicU8::new(0);

/// Switch the active palette. Takes effect on the next frame.
pub fn set_active(kind: ThemeKind) {
    let raw = match kind {
        ThemeKind::Catppuccin => 0,
        ThemeKind::Lcars => 1,
    };
    ACTIVE.store(raw, Ordering::Relaxed);
}

pub fn active() -> ThemeKind {
    match ACTIVE.load(Ordering::Relaxed) {
        1 => ThemeKind::Lcars,
        _ => ThemeKind::Catppuccin,
    }
}

struct Palette {
    bg: Color,
    text: Color,
    dim: Color,
    border: Color,
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    info: Color,
    high: Color,
    critical: Color,
}

// Catppuccin mocha.
const CATPPUCCIN: Palette = Palette {
    bg: Color::Rgb(0x1e, 0x1e, 0x2e),
    text: Color::Rgb(0xcd, 0xd6, 0xf4),
    dim: Color::Rgb(0x6c, 0x70, 0x86),
    border: Color::Rgb(0x45, 0x47, 0x5a),
    accent: Color::Rgb(0xcb, 0xa6, 0xf7),
    success: Color::Rgb(0xa6, 0xe3, 0xa1),
    warning: Color::Rgb(0xf9, 0xe2, 0xaf),
    danger: Color::Rgb(0xf3, 0x8b, 0xa8),
    info: Color::Rgb(0x89, 0xb4, 0xfa),
    high: Color::Rgb(0xfa, 0xb3, 0x87),
    critical: Color::Rgb(0xf3, 0x8b, 0xa8),
};

// LCARS: black panel, amber/lilac accents.
const LCARS: Palette = Palette {
    bg: Color::Rgb(0x00, 0x00, 0x00),
    text: Color::Rgb(0xff, 0xcc, 0x99),
    dim: Color::Rgb(0x99, 0x66, 0x33),
    border: Color::Rgb(0xcc, 0x99, 0xcc),
    accent: Color::Rgb(0xff, 0x99, 0x00),
    success: Color::Rgb(0x99, 0xcc, 0x99),
    warning: Color::Rgb(0xff, 0x99, 0x00),
    danger: Color::Rgb(0xcc, 0x66, 0x66),
    info: Color::Rgb(0x99, 0x99, 0xff),
    high: Color::Rgb(0xff, 0x99, 0x00),
    critical: Color::Rgb(0xff, 0x33, 0x33),
};

fn palette() -> &'static Palette {
    match active() {
        ThemeKind::Catppuccin => &CATPPUCCIN,
        ThemeKind::Lcars => &LCARS,
    }
}

// ── Colors ──────────────────────────────────────────────────────────

pub fn bg() -> Color {
    palette().bg
}
pub fn text() -> Color {
    palette().text
}
pub fn dim() -> Color {
    palette().dim
}
pub fn border() -> Color {
    palette().border
}
pub fn accent() -> Color {
    palette().accent
}
pub fn success() -> Color {
    palette().success
}
pub fn warning() -> Color {
    palette().warning
}
pub fn danger() -> Color {
    palette().danger
}
pub fn info() -> Color {
    palette().info
}
pub fn high() -> Color {
    palette().high
}
pub fn critical() -> Color {
    palette().critical
}

// ── Styles ──────────────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(accent()).add_modifier(Modifier::BOLD)
}

pub fn border_default() -> Style {
    Style::default().fg(border())
}

pub fn border_focused() -> Style {
    Style::default().fg(accent())
}

pub fn key_hint() -> Style {
    Style::default().fg(dim())
}

pub fn key_hint_key() -> Style {
    Style::default().fg(info())
}

pub fn table_row() -> Style {
    Style::default().fg(text())
}

pub fn selected_row() -> Style {
    Style::default()
        .fg(accent())
        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
}

pub fn tab_active() -> Style {
    Style::default().fg(accent()).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(dim())
}
