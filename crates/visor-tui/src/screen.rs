//! Screen identifiers. Login is shown while no session exists; the two
//! views are navigable by number keys once logged in.

use std::fmt;

use visor_core::{Phase, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Login,
    Dashboard,
    Demos,
}

impl ScreenId {
    /// Views in tab-bar order.
    pub const TABS: [ScreenId; 2] = [Self::Dashboard, Self::Demos];

    /// Screen for the dashboard's phase and view.
    pub fn for_state(phase: &Phase, view: View) -> Self {
        match (phase, view) {
            (Phase::Login, _) => Self::Login,
            (Phase::Authenticated(_), View::Dashboard) => Self::Dashboard,
            (Phase::Authenticated(_), View::Demos) => Self::Demos,
        }
    }

    pub fn view(self) -> Option<View> {
        match self {
            Self::Login => None,
            Self::Dashboard => Some(View::Dashboard),
            Self::Demos => Some(View::Demos),
        }
    }

    /// Number key of a tab. Login has none.
    pub fn number(self) -> u8 {
        match self {
            Self::Login => 0,
            Self::Dashboard => 1,
            Self::Demos => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Demos),
            _ => None,
        }
    }

    /// Next tab (wraps around).
    pub fn next(self) -> Self {
        match self {
            Self::Dashboard => Self::Demos,
            Self::Demos => Self::Dashboard,
            Self::Login => Self::Login,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Demos => "Demos",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use visor_core::Identity;

    use super::*;

    #[test]
    fn login_phase_always_shows_login() {
        assert_eq!(ScreenId::for_state(&Phase::Login, View::Demos), ScreenId::Login);
        let phase = Phase::Authenticated(Identity {
            name: "Shami".into(),
            score: 0.61,
        });
        assert_eq!(ScreenId::for_state(&phase, View::Demos), ScreenId::Demos);
    }

    #[test]
    fn tabs_round_trip_through_number_keys() {
        for id in ScreenId::TABS {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
            assert_eq!(id.next().next(), id);
        }
        assert_eq!(ScreenId::from_number(0), None);
    }
}
