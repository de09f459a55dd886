// ── Runtime dashboard configuration ──
//
// Periods, limits and thresholds the orchestration layer runs with. Never
// touches disk: `visor-config` (or a test) builds one and hands it in.

use std::time::Duration;

use crate::auth::AuthConfig;
use crate::stream::StreamConfig;

/// Poll periods and list limits, one per panel.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub health: Duration,
    pub detections: Duration,
    pub audio: Duration,
    pub security: Duration,
    pub action: Duration,
    pub timeline: Duration,
    pub attendance: Duration,
    pub face_last: Duration,
    pub timeline_limit: u32,
    pub attendance_limit: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(3),
            detections: Duration::from_millis(800),
            audio: Duration::from_secs(3),
            security: Duration::from_secs(2),
            action: Duration::from_secs(5),
            timeline: Duration::from_secs(5),
            attendance: Duration::from_secs(5),
            face_last: Duration::from_secs(5),
            timeline_limit: 80,
            attendance_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub polling: PollingConfig,
    pub auth: AuthConfig,
    pub stream: StreamConfig,
}
