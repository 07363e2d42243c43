//! Status pills and severity dots — one color table for every view.
//!
//! online/up/running/resolved → green; degraded/investigating → yellow;
//! offline/down/active → red; unknown → gray; high → orange;
//! critical → bright red; low → blue.

use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use opsdeck_core::model::Severity;

use crate::theme;

/// Color for a raw status token.
pub fn status_color(token: &str) -> ratatui::style::Color {
    match token {
        "online" | "up" | "running" | "resolved" => theme::success(),
        "degraded" | "investigating" | "restarting" => theme::warning(),
        "offline" | "down" | "active" | "exited" | "stopped" => theme::danger(),
        _ => theme::dim(),
    }
}

/// Status dot: ● colored per the table, ○ for unknown.
pub fn status_dot(token: &str) -> Span<'static> {
    let symbol = if token == "unknown" { "○" } else { "●" };
    Span::styled(symbol, Style::default().fg(status_color(token)))
}

/// Pulsing variant for LIVE mode: dims on alternating ticks. Without
/// LIVE mode the dot never pulses.
pub fn status_dot_pulse(token: &str, live: bool, pulse_on: bool) -> Span<'static> {
    if live && !pulse_on {
        Span::styled("●", Style::default().fg(theme::dim()))
    } else {
        status_dot(token)
    }
}

/// Badge showing the raw status token uppercased.
pub fn status_pill(token: &str) -> Span<'static> {
    Span::styled(
        format!(" {} ", token.to_uppercase()),
        Style::default()
            .fg(theme::bg())
            .bg(status_color(token))
            .add_modifier(Modifier::BOLD),
    )
}

/// Severity color: critical bright red, high orange, medium yellow,
/// low blue.
pub fn severity_color(severity: Severity) -> ratatui::style::Color {
    match severity {
        Severity::Critical => theme::critical(),
        Severity::High => theme::high(),
        Severity::Medium => theme::warning(),
        Severity::Low => theme::info(),
    }
}

/// Severity dot with the shared coloring.
pub fn severity_dot(severity: Severity) -> Span<'static> {
    Span::styled("●", Style::default().fg(severity_color(severity)))
}
