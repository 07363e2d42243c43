//! Data rows and small display formatters.

use chrono::{DateTime, Utc};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme;

/// A data row: small uppercase label on the left, value on the right.
pub fn data_row<'a>(label: &str, value: impl Into<String>) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {:<14}", label.to_uppercase()),
            Style::default().fg(theme::dim()).add_modifier(Modifier::DIM),
        ),
        Span::styled(value.into(), Style::default().fg(theme::text())),
    ])
}

/// "just now" / "42s ago" / "7m ago" / "3h ago" / "2d ago".
pub fn relative_time(ts: DateTime<Utc>) -> String {
    let secs = (Utc::now() - ts).num_seconds().max(0);
    if secs < 5 {
        "just now".into()
    } else if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

/// Option display with the "--" placeholder.
pub fn opt(value: Option<&str>) -> String {
    value.unwrap_or("--").to_owned()
}

/// Truncate to `max` chars, appending an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_owned()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_uses_placeholder() {
        assert_eq!(opt(None), "--");
        assert_eq!(opt(Some("10.0.0.5")), "10.0.0.5");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 8), "a-very-…");
    }
}
