use crate::client::{RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult};
use crate::models::{Attendance, Timeline};

impl VisionClient {
    /// Most recent face events, newest first.
    pub async fn timeline(&self, limit: u32) -> EndpointResult<Timeline> {
        self.call(
            EndpointFamily::Timeline,
            RequestSpec::get("timeline").query("limit", limit),
        )
        .await
    }

    /// Per-person attendance totals.
    pub async fn attendance(&self, limit: u32) -> EndpointResult<Attendance> {
        self.call(
            EndpointFamily::Attendance,
            RequestSpec::get("attendance").query("limit", limit),
        )
        .await
    }
}
