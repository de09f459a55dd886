// visor-api: async client for the vision-inference backend.
//
// One `VisionClient` covers every endpoint family (REST JSON, multipart
// uploads, raw image fetches and the MJPEG video stream). Every call
// returns an `EndpointResult`, never a raw transport error.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod mjpeg;
pub mod models;
pub mod transport;

pub use client::{Body, FormField, RequestSpec, VisionClient};
pub use endpoints::FrameStream;
pub use error::{ApiError, EndpointFamily, EndpointResult, Error};
pub use models::{ImageFile, ImageSource};
pub use transport::{TlsMode, TransportConfig};
