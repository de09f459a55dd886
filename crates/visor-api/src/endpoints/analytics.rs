use bytes::Bytes;
use url::Url;

use crate::client::{RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult};
use crate::models::{ActionLast, AudioLast, SecurityLast};

impl VisionClient {
    pub async fn action_last(&self) -> EndpointResult<ActionLast> {
        self.call(EndpointFamily::ActionLast, RequestSpec::get("action/last"))
            .await
    }

    pub async fn audio_last(&self) -> EndpointResult<AudioLast> {
        self.call(EndpointFamily::AudioLast, RequestSpec::get("audio/last"))
            .await
    }

    pub async fn security_last(&self) -> EndpointResult<SecurityLast> {
        self.call(EndpointFamily::SecurityLast, RequestSpec::get("security/last"))
            .await
    }

    /// Latest cropped frame of an unknown face, as raw image bytes.
    pub async fn unknown_frame(&self, unknown_id: u64) -> EndpointResult<Bytes> {
        self.call_bytes(
            EndpointFamily::UnknownFrame,
            RequestSpec::get("security/unknown-frame").query("unknown_id", unknown_id),
        )
        .await
    }

    /// Cache-busted preview URL for an unknown face.
    pub fn unknown_frame_url(&self, unknown_id: u64, nonce: u64) -> EndpointResult<Url> {
        let query = [
            ("unknown_id".to_owned(), unknown_id.to_string()),
            ("t".to_owned(), nonce.to_string()),
        ];
        self.url("security/unknown-frame", &query)
            .map_err(|e| e.into_api_error(EndpointFamily::UnknownFrame))
    }
}
