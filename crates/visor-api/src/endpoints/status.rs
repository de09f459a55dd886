use crate::client::{RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult};
use crate::models::{CaptureResponse, Detections, Health};

impl VisionClient {
    /// Backend liveness: camera, model and uploader flags.
    pub async fn health(&self) -> EndpointResult<Health> {
        self.call(EndpointFamily::Health, RequestSpec::get("health"))
            .await
    }

    /// Latest object detections from the live camera.
    pub async fn detections(&self) -> EndpointResult<Detections> {
        self.call(EndpointFamily::Detections, RequestSpec::get("detections"))
            .await
    }

    /// Grab the current frame and upload it.
    ///
    /// A backend refusal (cooldown, no frame) arrives as a non-2xx status and
    /// surfaces as an error whose message is the backend's `error` field.
    pub async fn capture(&self) -> EndpointResult<CaptureResponse> {
        self.call(EndpointFamily::Capture, RequestSpec::post("capture"))
            .await
    }
}
