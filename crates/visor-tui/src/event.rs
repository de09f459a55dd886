//! Crossterm event reader running in a background tokio task.
//!
//! Merges key presses and resizes with a 4 Hz tick (throbbers, toast
//! expiry) and a ~30 FPS render tick into one `mpsc` channel.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal resized to (cols, rows).
    Resize(u16, u16),
    Tick,
    Render,
}

/// Keep key presses and resizes; drop releases, repeats, mouse and focus.
fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

fn skipping(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    pub fn new(tick_rate: Duration, render_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_loop(tx, cancel.clone(), tick_rate, render_rate));
        Self { rx, cancel }
    }

    /// `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_loop(
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
    render_rate: Duration,
) {
    let mut terminal = EventStream::new();
    let mut tick = skipping(tick_rate);
    let mut render = skipping(render_rate);

    loop {
        let event = tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(Ok(raw)) = terminal.next() => match translate(raw) {
                Some(event) => event,
                None => continue,
            },

            _ = tick.tick() => Event::Tick,

            _ = render.tick() => Event::Render,
        };

        if tx.send(event).is_err() {
            break;
        }
    }
}
