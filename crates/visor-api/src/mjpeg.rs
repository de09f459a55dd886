// MJPEG frame splitting.
//
// The backend serves `multipart/x-mixed-replace` JPEG frames. Rather than
// parse part headers, frames are cut on the JPEG start/end-of-image markers,
// which also tolerates servers that omit `Content-Length`.

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Frames larger than this are discarded and the splitter resyncs.
pub const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Incremental JPEG frame extractor.
#[derive(Debug)]
pub struct FrameSplitter {
    buf: BytesMut,
    max_frame: usize,
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::with_limit(MAX_FRAME_BYTES)
    }
}

impl FrameSplitter {
    pub fn with_limit(max_frame: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let Some(start) = find(&self.buf, &SOI, 0) else {
                // Keep a trailing 0xFF: it may be the first half of a marker.
                let keep = usize::from(self.buf.last() == Some(&0xFF));
                let drop = self.buf.len() - keep;
                let _ = self.buf.split_to(drop);
                return None;
            };
            if start > 0 {
                let _ = self.buf.split_to(start);
            }

            if let Some(end) = find(&self.buf, &EOI, SOI.len()) {
                return Some(self.buf.split_to(end + EOI.len()).freeze());
            }

            if self.buf.len() <= self.max_frame {
                return None;
            }
            // Oversized: skip this start marker and look for the next one.
            let _ = self.buf.split_to(SOI.len());
        }
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Turn a stream of body chunks into a stream of JPEG frames.
pub fn frames<S, E>(chunks: S) -> impl Stream<Item = Result<Bytes, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    async_stream::try_stream! {
        let mut splitter = FrameSplitter::default();
        futures_util::pin_mut!(chunks);
        while let Some(chunk) = chunks.next().await {
            splitter.push(&chunk?);
            while let Some(frame) = splitter.next_frame() {
                yield frame;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn jpeg(payload: &[u8]) -> Vec<u8> {
        let mut v = SOI.to_vec();
        v.extend_from_slice(payload);
        v.extend_from_slice(&EOI);
        v
    }

    #[test]
    fn splits_frames_across_part_headers() {
        let mut body = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        body.extend(jpeg(b"one"));
        body.extend_from_slice(b"\r\n--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        body.extend(jpeg(b"two"));

        let mut s = FrameSplitter::default();
        s.push(&body);
        assert_eq!(s.next_frame().as_deref(), Some(jpeg(b"one").as_slice()));
        assert_eq!(s.next_frame().as_deref(), Some(jpeg(b"two").as_slice()));
        assert_eq!(s.next_frame(), None);
    }

    #[test]
    fn marker_split_between_chunks() {
        let frame = jpeg(b"abc");
        let (a, b) = frame.split_at(frame.len() - 1);
        let mut s = FrameSplitter::default();
        s.push(a);
        assert_eq!(s.next_frame(), None);
        s.push(b);
        assert_eq!(s.next_frame().as_deref(), Some(frame.as_slice()));
    }

    #[test]
    fn oversized_frame_is_dropped() {
        let mut s = FrameSplitter::with_limit(8);
        s.push(&SOI);
        s.push(&[0u8; 32]);
        assert_eq!(s.next_frame(), None);
        s.push(&jpeg(b"ok"));
        assert_eq!(s.next_frame().as_deref(), Some(jpeg(b"ok").as_slice()));
    }

    #[tokio::test]
    async fn frame_stream_yields_each_frame() {
        let chunks = vec![
            Ok::<_, std::io::Error>(Bytes::from(jpeg(b"a"))),
            Ok(Bytes::from(jpeg(b"b"))),
        ];
        let out: Vec<_> = frames(stream::iter(chunks)).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(Result::is_ok));
    }
}
