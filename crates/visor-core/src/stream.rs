// Live video feed: reconnection state machine and frame reader.
//
// `StreamReconnector` owns the stream session (`nonce` + status). The URL a
// viewer connects to is a pure function of the nonce, so issuing a new
// nonce is how a reconnect is requested. `StreamFeed` is the viewer: it
// follows the nonce, reads frames, and reports the first frame (load) or a
// failure (error) back to the reconnector.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use visor_api::{ApiError, EndpointFamily, EndpointResult, FrameStream, VisionClient};

use crate::lifecycle::Liveness;

/// Connection state of the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StreamStatus {
    Connecting,
    Live,
    Reconnecting,
}

/// Snapshot of the stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSession {
    /// Cache-busting token; strictly increasing.
    pub nonce: u64,
    pub status: StreamStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Delay between a load error and the next nonce.
    pub retry_delay: Duration,
    /// Proactive refresh period, regardless of status.
    pub refresh_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(1000),
            refresh_interval: Duration::from_secs(60),
        }
    }
}

// ── Reconnector ─────────────────────────────────────────────────────

struct Shared {
    session: watch::Sender<StreamSession>,
    liveness: Liveness,
    cancel: CancellationToken,
    retry_delay: Duration,
}

/// Reconnect-with-delay and periodic refresh for the live feed.
///
/// Clones share one session. `stop()` is synchronous and idempotent; after
/// it returns, neither timers nor callbacks change the session again.
#[derive(Clone)]
pub struct StreamReconnector {
    shared: Arc<Shared>,
}

impl StreamReconnector {
    /// Start in `Connecting` with nonce 1 and spawn the refresh timer.
    pub fn start(config: StreamConfig) -> Self {
        let (session, _) = watch::channel(StreamSession {
            nonce: 1,
            status: StreamStatus::Connecting,
        });
        let shared = Arc::new(Shared {
            session,
            liveness: Liveness::default(),
            cancel: CancellationToken::new(),
            retry_delay: config.retry_delay,
        });
        tokio::spawn(refresh_task(Arc::clone(&shared), config.refresh_interval));
        Self { shared }
    }

    pub fn session(&self) -> StreamSession {
        *self.shared.session.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamSession> {
        self.shared.session.subscribe()
    }

    /// A frame arrived for `nonce`. Stale nonces are ignored.
    pub fn on_load(&self, nonce: u64) {
        self.shared.liveness.run_if_live(|| {
            self.shared.session.send_if_modified(|s| {
                if s.nonce != nonce || s.status == StreamStatus::Live {
                    return false;
                }
                s.status = StreamStatus::Live;
                true
            })
        });
    }

    /// Loading `nonce` failed: go `Reconnecting`, then issue a new nonce
    /// after the retry delay. A repeated error for the same nonce while
    /// already reconnecting is ignored, so each error bumps the nonce once.
    pub fn on_error(&self, nonce: u64) {
        let accepted = self
            .shared
            .liveness
            .run_if_live(|| {
                self.shared.session.send_if_modified(|s| {
                    if s.nonce != nonce || s.status == StreamStatus::Reconnecting {
                        return false;
                    }
                    s.status = StreamStatus::Reconnecting;
                    true
                })
            })
            .unwrap_or(false);
        if !accepted {
            return;
        }

        warn!(nonce, retry_ms = self.shared.retry_delay.as_millis(), "video stream failed, reconnecting");
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = shared.cancel.cancelled() => {}
                () = tokio::time::sleep(shared.retry_delay) => bump_nonce(&shared),
            }
        });
    }

    pub fn stop(&self) {
        self.shared.cancel.cancel();
        self.shared.liveness.retire();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.liveness.is_retired()
    }

    fn cancel_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    fn liveness(&self) -> &Liveness {
        &self.shared.liveness
    }
}

fn bump_nonce(shared: &Shared) {
    shared.liveness.run_if_live(|| {
        shared.session.send_modify(|s| {
            s.nonce += 1;
            s.status = StreamStatus::Connecting;
        });
        debug!(nonce = shared.session.borrow().nonce, "stream nonce issued");
    });
}

async fn refresh_task(shared: Arc<Shared>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            _ = interval.tick() => bump_nonce(&shared),
        }
    }
}

// ── Feed ────────────────────────────────────────────────────────────

/// Something that can open the live stream for a nonce.
pub trait FrameSource: Send + Sync + 'static {
    fn open(&self, nonce: u64) -> impl Future<Output = EndpointResult<FrameStream>> + Send;
}

impl FrameSource for VisionClient {
    fn open(&self, nonce: u64) -> impl Future<Output = EndpointResult<FrameStream>> + Send {
        self.open_stream(nonce)
    }
}

/// Viewer side of the live stream.
pub struct StreamFeed;

impl StreamFeed {
    /// Follow `reconnector`'s nonce, reading frames from `source` and handing
    /// each to `on_frame`. Ends when the reconnector is stopped.
    pub fn spawn<S, F>(reconnector: StreamReconnector, source: S, on_frame: F) -> JoinHandle<()>
    where
        S: FrameSource,
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        tokio::spawn(feed_task(reconnector, source, on_frame))
    }
}

async fn feed_task<S, F>(reconnector: StreamReconnector, source: S, on_frame: F)
where
    S: FrameSource,
    F: Fn(Bytes) + Send + Sync + 'static,
{
    let cancel = reconnector.cancel_token();
    let mut rx = reconnector.subscribe();

    loop {
        let nonce = rx.borrow_and_update().nonce;
        debug!(nonce, "connecting video stream");

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            alive = next_nonce(&mut rx, nonce) => {
                if !alive { break }
                continue;
            }
            err = read_frames(&reconnector, &source, nonce, &on_frame) => {
                debug!(nonce, error = %err, "video stream attempt ended");
                reconnector.on_error(nonce);
            }
        }

        let alive = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            alive = next_nonce(&mut rx, nonce) => alive,
        };
        if !alive {
            break;
        }
    }

    info!("video stream feed stopped");
}

/// Wait for a nonce other than `current`. `false` once the sender is gone.
async fn next_nonce(rx: &mut watch::Receiver<StreamSession>, current: u64) -> bool {
    rx.wait_for(|s| s.nonce != current).await.is_ok()
}

/// Read until the stream fails; always returns the failure.
async fn read_frames<S, F>(
    reconnector: &StreamReconnector,
    source: &S,
    nonce: u64,
    on_frame: &F,
) -> ApiError
where
    S: FrameSource,
    F: Fn(Bytes),
{
    let mut frames = match source.open(nonce).await {
        Ok(frames) => frames,
        Err(e) => return e,
    };

    let mut live = false;
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => {
                if !live {
                    reconnector.on_load(nonce);
                    live = true;
                }
                reconnector.liveness().run_if_live(|| on_frame(frame));
            }
            Err(e) => return e,
        }
    }

    ApiError {
        family: EndpointFamily::VideoStream,
        message: Some("stream_ended".into()),
        status: None,
    }
}
