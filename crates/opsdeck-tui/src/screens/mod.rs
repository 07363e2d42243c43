//! Screen registry.

mod dashboard;
mod hosts;
mod incidents;
mod network;
mod smarthome;

use crate::component::Component;
use crate::screen::ScreenId;

/// Instantiate every screen, keyed by its id.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()) as Box<dyn Component>,
        ),
        (ScreenId::Hosts, Box::new(hosts::HostsScreen::new())),
        (ScreenId::SmartHome, Box::new(smarthome::SmartHomeScreen::new())),
        (ScreenId::Incidents, Box::new(incidents::IncidentsScreen::new())),
        (ScreenId::Network, Box::new(network::NetworkScreen::new())),
    ]
}
