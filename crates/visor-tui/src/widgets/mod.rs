//! Small rendering helpers shared by the screens.

pub mod panel;
pub mod prompt;
pub mod status_indicator;
pub mod tabs;
