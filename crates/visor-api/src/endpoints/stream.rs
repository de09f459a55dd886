use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::debug;
use url::Url;

use crate::client::{RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult, Error};
use crate::mjpeg;

/// JPEG frames read from the live video stream.
pub type FrameStream = Pin<Box<dyn Stream<Item = EndpointResult<Bytes>> + Send>>;

impl VisionClient {
    /// Video stream URL for a cache-busting nonce: `{base}/video-stream?t={nonce}`.
    pub fn stream_url(&self, nonce: u64) -> EndpointResult<Url> {
        self.url("video-stream", &[("t".to_owned(), nonce.to_string())])
            .map_err(|e| e.into_api_error(EndpointFamily::VideoStream))
    }

    /// Open the MJPEG stream for `nonce` and split it into frames.
    ///
    /// Only connecting is bounded by a timeout; the returned stream runs
    /// until the backend closes it or a read fails.
    pub async fn open_stream(&self, nonce: u64) -> EndpointResult<FrameStream> {
        let family = EndpointFamily::VideoStream;
        let spec = RequestSpec::get("video-stream").query("t", nonce);
        let resp = self
            .send(self.stream_http(), &spec)
            .await
            .map_err(|e| e.into_api_error(family))?;
        debug!(nonce, "video stream connected");

        let chunks = resp.bytes_stream().map(|r| r.map_err(Error::Transport));
        let frames = mjpeg::frames(chunks).map(move |r| r.map_err(|e| e.into_api_error(family)));
        Ok(Box::pin(frames))
    }
}
