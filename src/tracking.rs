// Hand tracking plumbing.
// Trackers run at their own pace and only ever *post* into a single slot; the
// frame loop drains it at most once per tick. Positions are latest-wins, so a
// fast tracker can never make the display lag behind. Hand-lost edges are
// counted as they are posted, so none is missed between two frames.

use crate::config::PALM_CENTER_LANDMARK;
use crate::error::Error;
use glam::Vec2;
use serde::Deserialize;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// One tracking result: the palm center in normalized camera space, if a hand was found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandSample {
    pub palm: Option<Vec2>,
}

/// Single-slot, latest-wins mailbox shared between one producer and the frame loop.
pub struct Latest<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self { slot: Arc::new(Mutex::new(None)) }
    }
}

impl<T> Latest<T> {
    /// Overwrite whatever is waiting.
    pub fn post(&self, value: T) {
        // A poisoned slot only means a producer panicked mid-post; the data is a plain value.
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(value);
    }

    /// Take the waiting value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

/// What the frame loop picks up from the sink since its last drain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackingUpdate {
    /// Newest sample, if anything was posted.
    pub sample: Option<HandSample>,
    /// Hand seen -> hand gone transitions, in posting order.
    pub hands_lost: u32,
}

#[derive(Default)]
struct Inbox {
    pending: TrackingUpdate,
    was_active: bool,
}

/// Where trackers post. `running` is the teardown guard: once it flips to
/// false nothing is posted anymore.
#[derive(Clone)]
pub struct TrackingSink {
    inbox: Arc<Mutex<Inbox>>,
    running: Arc<AtomicBool>,
}

impl Default for TrackingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingSink {
    pub fn new() -> Self {
        Self { inbox: Arc::default(), running: Arc::new(AtomicBool::new(true)) }
    }

    fn inbox(&self) -> MutexGuard<'_, Inbox> {
        self.inbox.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn post(&self, sample: HandSample) -> bool {
        if !self.is_running() {
            return false;
        }
        let detected = sample.palm.is_some();
        let mut inbox = self.inbox();
        if inbox.was_active && !detected {
            inbox.pending.hands_lost += 1;
        }
        inbox.was_active = detected;
        inbox.pending.sample = Some(sample);
        true
    }

    /// Everything posted since the last drain; leaves the sink empty.
    pub fn drain(&self) -> TrackingUpdate {
        std::mem::take(&mut self.inbox().pending)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn shut(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// A source of hand samples. Only start/stop and a readiness poll go back to it.
pub trait HandTracker {
    fn label(&self) -> String;
    /// True once the capability exists (device present, stream openable...).
    fn is_ready(&self) -> bool;
    fn start(&mut self, sink: TrackingSink) -> Result<(), Error>;
    fn stop(&mut self);
}

/// Polls a not-yet-available tracker at a fixed interval and starts it once ready.
pub struct TrackerPoller {
    tracker: Box<dyn HandTracker>,
    sink: TrackingSink,
    interval: Duration,
    last_poll: Option<Instant>,
    started: bool,
}

impl TrackerPoller {
    pub fn new(tracker: Box<dyn HandTracker>, sink: TrackingSink, interval: Duration) -> Self {
        Self { tracker, sink, interval, last_poll: None, started: false }
    }

    /// Call once per frame. Returns true while the tracker is running.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.started {
            return true;
        }
        if let Some(last) = self.last_poll {
            if now.duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_poll = Some(now);

        if !self.tracker.is_ready() {
            log::debug!("{} not ready yet", self.tracker.label());
            return false;
        }
        match self.tracker.start(self.sink.clone()) {
            Ok(()) => {
                log::info!("Hand tracking started: {}", self.tracker.label());
                self.started = true;
            }
            // Retried on the next poll.
            Err(e) => log::warn!("{e}"),
        }
        self.started
    }
}

impl Drop for TrackerPoller {
    fn drop(&mut self) {
        self.sink.shut();
        if self.started {
            self.tracker.stop();
            log::info!("Hand tracking stopped: {}", self.tracker.label());
        }
    }
}

/* ---------- Pointer tracker: the mouse stands in for a hand ---------- */

/// Holding the left mouse button = a hand at the cursor.
/// Clones share one sink: the poller owns one, the window loop feeds another.
#[derive(Clone, Default)]
pub struct PointerTracker {
    sink: Rc<RefCell<Option<TrackingSink>>>,
}

impl PointerTracker {
    /// Feed the window's pointer state (pixels). Posts once per call.
    pub fn feed(&self, cursor: Option<(f32, f32)>, pressed: bool, size: (usize, usize)) {
        let sink = self.sink.borrow();
        let Some(sink) = sink.as_ref() else { return };
        let (w, h) = (size.0.max(1) as f32, size.1.max(1) as f32);
        let palm = match cursor {
            // x is pre-mirrored so the mirrored palm mapping lands under the cursor
            Some((x, y)) if pressed => Some(Vec2::new(1.0 - x / w, y / h)),
            _ => None,
        };
        sink.post(HandSample { palm });
    }
}

impl HandTracker for PointerTracker {
    fn label(&self) -> String {
        "pointer (hold left mouse button)".into()
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn start(&mut self, sink: TrackingSink) -> Result<(), Error> {
        *self.sink.borrow_mut() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.borrow_mut().take();
    }
}

/* ---------- Landmark stream: JSON lines from an external detector ---------- */

#[derive(Deserialize)]
struct Landmark {
    x: f32,
    y: f32,
}

/// One line of the stream, MediaPipe `multiHandLandmarks` shaped.
#[derive(Deserialize)]
struct LandmarkFrame {
    #[serde(default)]
    hands: Vec<Vec<Landmark>>,
}

/// Parse one JSON line into a sample. Only the first hand's palm center is kept;
/// a single-point hand is taken as the palm itself.
pub fn parse_landmark_line(line: &str) -> Result<HandSample, Error> {
    let frame: LandmarkFrame = serde_json::from_str(line)
        .map_err(|e| Error::TrackingUnavailable(format!("bad landmark line: {e}")))?;
    let palm = match frame.hands.first() {
        None => None,
        Some(hand) if hand.is_empty() => None,
        Some(hand) if hand.len() == 1 => Some(Vec2::new(hand[0].x, hand[0].y)),
        Some(hand) => {
            let lm = hand.get(PALM_CENTER_LANDMARK).ok_or_else(|| {
                Error::TrackingUnavailable(format!("hand has only {} landmarks", hand.len()))
            })?;
            Some(Vec2::new(lm.x, lm.y))
        }
    };
    Ok(HandSample { palm })
}

#[derive(Clone, Debug, PartialEq)]
pub enum LandmarkSource {
    Stdin,
    Path(PathBuf),
}

impl LandmarkSource {
    pub fn from_arg(path: PathBuf) -> Self {
        if path.as_os_str() == "-" { Self::Stdin } else { Self::Path(path) }
    }
}

/// Reads landmark lines on a background thread.
pub struct LandmarkStreamTracker {
    source: LandmarkSource,
    worker: Option<JoinHandle<()>>,
    sink: Option<TrackingSink>,
}

impl LandmarkStreamTracker {
    pub fn new(source: LandmarkSource) -> Self {
        Self { source, worker: None, sink: None }
    }
}

/// Pump lines into `post` until EOF, a read error or `post` refuses a sample.
fn pump_lines(reader: impl BufRead, post: impl Fn(HandSample) -> bool) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("Landmark stream read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_landmark_line(&line) {
            Ok(sample) => {
                if !post(sample) {
                    return;
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    // Stream over: the hand is gone.
    post(HandSample { palm: None });
    log::info!("Landmark stream ended");
}

/* Stdin can't be handed back once a thread blocks on it, so there is one reader
   per process. It outlives tracker restarts and posts to whichever sink is
   attached; lines arriving while nothing is attached are dropped. */

struct StdinRoute {
    sink: Option<TrackingSink>,
    reader_spawned: bool,
}

static STDIN_ROUTE: Mutex<StdinRoute> =
    Mutex::new(StdinRoute { sink: None, reader_spawned: false });

fn stdin_route() -> MutexGuard<'static, StdinRoute> {
    STDIN_ROUTE.lock().unwrap_or_else(|e| e.into_inner())
}

fn post_to_stdin_route(sample: HandSample) -> bool {
    if let Some(sink) = &stdin_route().sink {
        sink.post(sample);
    }
    true
}

fn attach_stdin(sink: TrackingSink) -> Result<(), Error> {
    let mut route = stdin_route();
    if !route.reader_spawned {
        std::thread::Builder::new()
            .name("landmarks-stdin".into())
            .spawn(|| pump_lines(io::stdin().lock(), post_to_stdin_route))
            .map_err(|e| Error::TrackingUnavailable(format!("spawn reader: {e}")))?;
        route.reader_spawned = true;
    }
    route.sink = Some(sink);
    Ok(())
}

fn detach_stdin() {
    stdin_route().sink = None;
}

impl HandTracker for LandmarkStreamTracker {
    fn label(&self) -> String {
        match &self.source {
            LandmarkSource::Stdin => "landmarks from stdin".into(),
            LandmarkSource::Path(p) => format!("landmarks from {}", p.display()),
        }
    }

    fn is_ready(&self) -> bool {
        match &self.source {
            LandmarkSource::Stdin => true,
            LandmarkSource::Path(p) => p.exists(),
        }
    }

    fn start(&mut self, sink: TrackingSink) -> Result<(), Error> {
        match &self.source {
            LandmarkSource::Stdin => attach_stdin(sink.clone())?,
            LandmarkSource::Path(p) => {
                let file = File::open(p).map_err(|e| {
                    Error::TrackingUnavailable(format!("open {}: {e}", p.display()))
                })?;
                let thread_sink = sink.clone();
                let worker = std::thread::Builder::new()
                    .name("landmarks-file".into())
                    .spawn(move || pump_lines(BufReader::new(file), |s| thread_sink.post(s)))
                    .map_err(|e| Error::TrackingUnavailable(format!("spawn reader: {e}")))?;
                self.worker = Some(worker);
            }
        }
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.shut();
        }
        if self.source == LandmarkSource::Stdin {
            detach_stdin();
        }
        // A file reader can still sit in a blocking read on an idle FIFO; it
        // exits on its next line (its sink is shut) or with the process.
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}
