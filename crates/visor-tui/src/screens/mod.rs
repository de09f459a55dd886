//! Screen implementations. Each screen is a top-level Component.

pub mod dashboard;
pub mod demos;
pub mod login;

use visor_core::DashboardConfig;

use crate::component::Component;
use crate::screen::ScreenId;

/// One component per screen.
pub fn create_screens(config: &DashboardConfig) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Login,
            Box::new(login::LoginScreen::new(
                config.auth.auto_login,
                config.auth.period,
                config.auth.threshold,
            )),
        ),
        (
            ScreenId::Dashboard,
            Box::new(dashboard::DashboardScreen::new()),
        ),
        (ScreenId::Demos, Box::new(demos::DemosScreen::new())),
    ]
}
