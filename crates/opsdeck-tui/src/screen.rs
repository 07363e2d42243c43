//! Screen trait and screen identifier enum.

use std::fmt;

/// Identifies each primary console screen, navigable by number keys 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Dashboard, // 1
    Hosts,     // 2
    SmartHome, // 3
    Incidents, // 4
    Network,   // 5
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 5] = [
        Self::Dashboard,
        Self::Hosts,
        Self::SmartHome,
        Self::Incidents,
        Self::Network,
    ];

    /// Numeric key (1-5) for this screen.
    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Hosts => 2,
            Self::SmartHome => 3,
            Self::Incidents => 4,
            Self::Network => 5,
        }
    }

    /// Screen from a numeric key (1-5). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Hosts),
            3 => Some(Self::SmartHome),
            4 => Some(Self::Incidents),
            5 => Some(Self::Network),
            _ => None,
        }
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Hosts => "Hosts",
            Self::SmartHome => "Home",
            Self::Incidents => "Incidents",
            Self::Network => "Network",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
