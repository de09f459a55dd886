// Endpoint methods on `VisionClient`, one module per endpoint group.

mod analytics;
mod emotion;
mod face;
mod records;
mod status;
mod stream;

pub use stream::FrameStream;
