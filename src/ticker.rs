use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveTime;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::{Clock, ClockTime, Countdown};
use crate::geometry::{CardPlacement, Layout, Markers};
use crate::model::EventId;
use crate::notify::StoreChange;
use crate::store::EventStore;

/// Everything a renderer needs for one repaint.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Store version the frame was computed from.
    pub version: u64,
    pub now: ClockTime,
    pub countdown: Countdown,
    pub markers: Markers,
    pub cards: Vec<CardPlacement>,
    /// Ids carrying a conflict badge, sorted.
    pub conflicts: Vec<EventId>,
}

pub fn compute_frame(store: &EventStore, layout: Layout, now: NaiveTime) -> Frame {
    let timeline = store.timeline(layout);
    let now_minute = ClockTime::from_naive(now);
    let mut conflicts: Vec<EventId> = store.conflicting_ids().into_iter().collect();
    conflicts.sort();
    Frame {
        version: store.version(),
        now: now_minute,
        countdown: Countdown::until_end_of_day(now),
        markers: timeline.markers(now_minute),
        cards: timeline.cards(),
        conflicts,
    }
}

/// Recompute a frame on every tick and on every store change that touches events.
pub async fn run_ticker(
    store: Arc<RwLock<EventStore>>,
    clock: Arc<dyn Clock>,
    layout: Layout,
    period: Duration,
    mut changes: broadcast::Receiver<StoreChange>,
    frames: watch::Sender<Frame>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            change = changes.recv() => match change {
                Ok(change) if !change.kind.touches_events() => continue,
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => debug!("ticker skipped {n} store changes"),
                Err(RecvError::Closed) => break,
            },
            _ = interval.tick() => {}
        }

        let started = Instant::now();
        let frame = {
            let guard = store.read().await;
            compute_frame(&guard, layout, clock.now())
        };
        metrics::counter!(crate::observability::FRAMES_TOTAL).increment(1);
        metrics::histogram!(crate::observability::FRAME_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        if frames.send(frame).is_err() {
            debug!("no frame receivers left");
            break;
        }
    }
    info!("ticker stopped");
}

/// A running ticker. Dropping the handle cancels the task.
pub struct Ticker {
    frames: watch::Receiver<Frame>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Compute the first frame immediately, then keep it fresh in the background.
    pub async fn spawn(
        store: Arc<RwLock<EventStore>>,
        clock: Arc<dyn Clock>,
        layout: Layout,
        period: Duration,
    ) -> Self {
        let (changes, first) = {
            let guard = store.read().await;
            (guard.notify.subscribe(), compute_frame(&guard, layout, clock.now()))
        };
        let (tx, rx) = watch::channel(first);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_ticker(
            store,
            clock,
            layout,
            period,
            changes,
            tx,
            cancel.clone(),
        ));
        Self {
            frames: rx,
            cancel,
            task: Some(task),
        }
    }

    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
