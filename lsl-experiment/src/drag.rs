//! Pointer-driven dragging of the relic onto a bucket.
//!
//! The controller never touches a rendering surface directly; everything it needs to know
//! about where things are comes through [`DragSurface`], so the whole gesture lifecycle can
//! be replayed against an in-memory [`SceneSurface`].

use std::time::Duration;

use lsl_core::{DragSample, DragState, Point, Rect};
use lsl_timing::{IntervalSampler, Timer};
use tracing::{debug, warn};

use crate::config::ExperimentConfig;
use crate::error::{ExpResult, ExperimentError};
use crate::layout::{BucketArrangement, ViewportGeometry};

/// Spatial queries and the few mutations the controller performs on screen.
pub trait DragSurface {
    fn draggable_rect(&self) -> Rect;
    fn bucket_count(&self) -> usize;
    /// Rectangle of bucket `bucket` in semantic (configuration) order.
    fn bucket_rect(&self, bucket: usize) -> Rect;
    fn move_draggable(&mut self, top_left: Point);

    /// Send the draggable back to `home`. Any animation is cosmetic.
    fn return_draggable(&mut self, home: Point, _transition: Duration) {
        self.move_draggable(home);
    }

    fn remove_draggable(&mut self) {}
}

/// In-memory surface: rectangles only.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSurface {
    draggable: Rect,
    buckets: Vec<Rect>,
    visible: bool,
    returns: usize,
}

impl SceneSurface {
    pub fn new(draggable: Rect, buckets: Vec<Rect>) -> Self {
        Self {
            draggable,
            buckets,
            visible: true,
            returns: 0,
        }
    }

    pub fn from_arrangement(geometry: &ViewportGeometry, arrangement: &BucketArrangement) -> Self {
        Self::new(geometry.home_rect(), arrangement.bucket_rects())
    }

    pub fn is_draggable_visible(&self) -> bool {
        self.visible
    }

    /// How many times the draggable was sent home.
    pub fn return_count(&self) -> usize {
        self.returns
    }
}

impl DragSurface for SceneSurface {
    fn draggable_rect(&self) -> Rect {
        self.draggable
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_rect(&self, bucket: usize) -> Rect {
        self.buckets[bucket]
    }

    fn move_draggable(&mut self, top_left: Point) {
        self.draggable = self.draggable.moved_to(top_left);
    }

    fn return_draggable(&mut self, home: Point, _transition: Duration) {
        self.returns += 1;
        self.move_draggable(home);
    }

    fn remove_draggable(&mut self) {
        self.visible = false;
    }
}

/// True when any corner of `draggable` lies strictly inside `bucket`.
///
/// This is not a full rectangle-intersection test: a bucket entirely inside the
/// draggable, or one touching it only along an edge, does not count. Drops are scored
/// with exactly this rule.
pub fn corner_overlap(draggable: &Rect, bucket: &Rect) -> bool {
    draggable
        .corners()
        .iter()
        .any(|&corner| bucket.contains_strict(corner))
}

/// First bucket, in configuration order, the draggable's corners land in.
pub fn find_drop_bucket<I>(draggable: &Rect, buckets: I) -> Option<usize>
where
    I: IntoIterator<Item = Rect>,
{
    buckets
        .into_iter()
        .position(|bucket| corner_overlap(draggable, &bucket))
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    /// Out-of-order or off-target event; nothing changed.
    Ignored,
    Grabbed,
    Moved,
    /// Released over no bucket. `attempt` is the zero-based attempt that just ended.
    Returned { attempt: usize },
    Dropped { bucket: usize, rt_ms: f64 },
}

pub struct DragController<S: DragSurface, T: Timer> {
    surface: S,
    timer: T,
    sampling_interval: Duration,
    return_transition: Duration,
    state: DragState,
    trial_start: u64,
    home: Point,
    grab_offset: Point,
    sampler: Option<IntervalSampler>,
    current: Vec<DragSample>,
    attempts: Vec<Vec<DragSample>>,
    drop: Option<(usize, f64)>,
}

impl<S: DragSurface, T: Timer> DragController<S, T> {
    /// Checks the surface geometry and starts the trial clock.
    pub fn new(surface: S, timer: T, config: &ExperimentConfig) -> ExpResult<Self> {
        let draggable = surface.draggable_rect();
        if draggable.is_degenerate() {
            return Err(ExperimentError::MalformedGeometry(format!(
                "draggable has no area: {draggable:?}"
            )));
        }
        if surface.bucket_count() == 0 {
            return Err(ExperimentError::InvalidConfiguration(
                "a drag trial needs at least one bucket".into(),
            ));
        }
        for i in 0..surface.bucket_count() {
            let rect = surface.bucket_rect(i);
            if rect.is_degenerate() {
                return Err(ExperimentError::MalformedGeometry(format!(
                    "bucket {i} has no area: {rect:?}"
                )));
            }
        }

        let trial_start = timer.now();
        Ok(Self {
            home: draggable.top_left(),
            surface,
            timer,
            sampling_interval: config.sampling_interval(),
            return_transition: Duration::from_millis(config.return_transition_ms),
            state: DragState::Idle,
            trial_start,
            grab_offset: Point::default(),
            sampler: None,
            current: Vec::new(),
            attempts: Vec::new(),
            drop: None,
        })
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn trial_start(&self) -> u64 {
        self.trial_start
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.is_some()
    }

    /// Samples recorded so far in the attempt in progress.
    pub fn sample_count(&self) -> usize {
        self.current.len()
    }

    /// Finished attempts, oldest first.
    pub fn attempts(&self) -> &[Vec<DragSample>] {
        &self.attempts
    }

    /// Semantic bucket and reaction time once dropped.
    pub fn drop_result(&self) -> Option<(usize, f64)> {
        self.drop
    }

    /// Records every sample that has come due. Hosts call this once per frame; the
    /// pointer handlers call it too so samples always precede the move they race.
    pub fn tick(&mut self) -> usize {
        let Some(sampler) = self.sampler.as_mut() else {
            return 0;
        };
        let now = self.timer.now();
        let center = self.surface.draggable_rect().center();
        let start = self.trial_start;
        let before = self.current.len();
        for due in sampler.due(now) {
            self.current.push(DragSample {
                x: center.x,
                y: center.y,
                time: due.saturating_sub(start) as f64 / 1_000_000.0,
            });
        }
        self.current.len() - before
    }

    pub fn pointer_down(&mut self, at: Point) -> PointerOutcome {
        if !self.state.accepts_grab() {
            if self.state == DragState::Dragging {
                warn!("duplicate pointer-down while dragging ignored");
            }
            return PointerOutcome::Ignored;
        }
        let rect = self.surface.draggable_rect();
        if !rect.contains(at) {
            return PointerOutcome::Ignored;
        }

        self.grab_offset = at - rect.top_left();
        self.current.clear();
        self.sampler = Some(IntervalSampler::start(
            self.sampling_interval,
            self.timer.now(),
        ));
        self.state = DragState::Dragging;
        debug!(attempt = self.attempts.len(), x = at.x, y = at.y, "grabbed");
        PointerOutcome::Grabbed
    }

    pub fn pointer_move(&mut self, at: Point) -> PointerOutcome {
        if self.state != DragState::Dragging {
            return PointerOutcome::Ignored;
        }
        self.tick();
        self.surface.move_draggable(at - self.grab_offset);
        PointerOutcome::Moved
    }

    pub fn pointer_up(&mut self) -> PointerOutcome {
        if self.state != DragState::Dragging {
            warn!(state = ?self.state, "pointer-up without a grab ignored");
            return PointerOutcome::Ignored;
        }
        self.tick();
        self.stop_sampler();
        let attempt = self.attempts.len();
        self.attempts.push(std::mem::take(&mut self.current));

        let draggable = self.surface.draggable_rect();
        let buckets = (0..self.surface.bucket_count()).map(|i| self.surface.bucket_rect(i));
        match find_drop_bucket(&draggable, buckets) {
            Some(bucket) => {
                self.surface.remove_draggable();
                let rt_ms = self.timer.elapsed_ms(self.trial_start);
                self.state = DragState::Dropped;
                self.drop = Some((bucket, rt_ms));
                debug!(bucket, rt_ms, attempts = attempt + 1, "dropped");
                PointerOutcome::Dropped { bucket, rt_ms }
            }
            None => {
                self.surface
                    .return_draggable(self.home, self.return_transition);
                self.state = DragState::Returned;
                debug!(attempt, "released outside every bucket");
                PointerOutcome::Returned { attempt }
            }
        }
    }

    /// Tears the gesture down before a drop. The attempt in flight is kept.
    /// Returns false if the trial had already ended.
    pub fn abandon(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if self.state == DragState::Dragging {
            self.tick();
            self.stop_sampler();
            self.attempts.push(std::mem::take(&mut self.current));
        }
        self.state = DragState::Abandoned;
        debug!(attempts = self.attempts.len(), "drag abandoned");
        true
    }

    /// Milliseconds since the trial started.
    pub fn elapsed_ms(&self) -> f64 {
        self.timer.elapsed_ms(self.trial_start)
    }

    pub fn into_attempts(self) -> Vec<Vec<DragSample>> {
        self.attempts
    }

    fn stop_sampler(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            let stats = sampler.stop(self.timer.now());
            debug!(fired = stats.fired, "sampler stopped");
        }
    }
}
