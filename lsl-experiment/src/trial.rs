use lsl_core::{Bucket, DragState, OutcomeRecord, Point, Rect};
use lsl_timing::Timer;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ExperimentConfig;
use crate::drag::{DragController, DragSurface, PointerOutcome, SceneSurface};
use crate::error::{ExpResult, ExperimentError, invalid};
use crate::layout::{BucketArrangement, Viewport, ViewportGeometry, arrange_buckets};
use crate::result::{BucketPlacement, RewardedBucket, assemble};
use crate::reward::sample_index;

/// How the rewarded bucket of a trial is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correctness {
    Fixed(usize),
    /// One weight per bucket; one draw per trial.
    Probabilistic(Vec<f64>),
}

impl Correctness {
    pub fn validate(&self, bucket_count: usize) -> ExpResult<()> {
        match self {
            Self::Fixed(index) if *index >= bucket_count => invalid(format!(
                "correct bucket {index} out of range for {bucket_count} buckets"
            )),
            Self::Probabilistic(weights) if weights.len() != bucket_count => invalid(format!(
                "{} reward weights for {bucket_count} buckets",
                weights.len()
            )),
            Self::Probabilistic(weights) if weights.iter().any(|w| !(0.0..=1.0).contains(w)) => {
                invalid(format!("reward weights {weights:?} must each lie in [0, 1]"))
            }
            Self::Probabilistic(weights) if !weights.iter().any(|w| *w > 0.0) => {
                invalid("reward weights are all zero")
            }
            _ => Ok(()),
        }
    }

    pub fn resolve<R: Rng + ?Sized>(
        &self,
        bucket_count: usize,
        rng: &mut R,
    ) -> ExpResult<RewardedBucket> {
        self.validate(bucket_count)?;
        Ok(match self {
            Self::Fixed(index) => RewardedBucket {
                index: *index,
                probabilities: None,
            },
            Self::Probabilistic(weights) => RewardedBucket {
                index: sample_index(weights, rng)?,
                probabilities: Some(weights.clone()),
            },
        })
    }
}

/// Everything the scheduler passes in to start one drag trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTrialConfig {
    /// Image of the relic being dragged.
    pub element: String,
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub text_prompt: String,
    #[serde(default)]
    pub randomize_bucket_order: bool,
    #[serde(default)]
    pub bucket_start_angle: f64,
    pub correctness: Correctness,
}

impl DragTrialConfig {
    pub fn validate(&self) -> ExpResult<()> {
        if self.buckets.is_empty() {
            return invalid("a drag trial needs at least one bucket");
        }
        if self.element.trim().is_empty() {
            return Err(ExperimentError::Setup("draggable has no image".into()));
        }
        if let Some(i) = self.buckets.iter().position(|b| b.image.trim().is_empty()) {
            return Err(ExperimentError::Setup(format!("bucket {i} has no image")));
        }
        if !self.bucket_start_angle.is_finite() {
            return invalid("bucket start angle must be finite");
        }
        self.correctness.validate(self.buckets.len())
    }
}

/// What a pointer-up led to.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialStep {
    Pending(PointerOutcome),
    Finished(OutcomeRecord),
}

/// One drag-and-drop trial from layout to finished record.
pub struct DragTrial<S: DragSurface, T: Timer> {
    config: DragTrialConfig,
    geometry: ViewportGeometry,
    arrangement: BucketArrangement,
    placements: Vec<BucketPlacement>,
    rewarded: RewardedBucket,
    controller: DragController<S, T>,
    finished: bool,
}

impl<T: Timer> DragTrial<SceneSurface, T> {
    /// Lays the trial out on an in-memory surface.
    pub fn setup<R: Rng + ?Sized>(
        config: DragTrialConfig,
        viewport: Viewport,
        experiment: &ExperimentConfig,
        timer: T,
        rng: &mut R,
    ) -> ExpResult<Self> {
        Self::setup_on(config, viewport, experiment, timer, rng, SceneSurface::from_arrangement)
    }
}

impl<S: DragSurface, T: Timer> DragTrial<S, T> {
    /// Validates `config`, computes the layout, draws the rewarded bucket and builds the
    /// surface with `make_surface`. The trial clock starts here.
    pub fn setup_on<R, F>(
        config: DragTrialConfig,
        viewport: Viewport,
        experiment: &ExperimentConfig,
        timer: T,
        rng: &mut R,
        make_surface: F,
    ) -> ExpResult<Self>
    where
        R: Rng + ?Sized,
        F: FnOnce(&ViewportGeometry, &BucketArrangement) -> S,
    {
        experiment.validate()?;
        config.validate()?;

        let geometry = ViewportGeometry::compute(viewport, &experiment.layout)?;
        let arrangement = arrange_buckets(
            &geometry,
            config.buckets.len(),
            config.bucket_start_angle,
            config.randomize_bucket_order,
            rng,
        )?;
        let names: Vec<String> = config.buckets.iter().map(|b| b.image.clone()).collect();
        let placements = BucketPlacement::from_arrangement(&arrangement, &names);
        let rewarded = config.correctness.resolve(config.buckets.len(), rng)?;

        let surface = make_surface(&geometry, &arrangement);
        if surface.bucket_count() != config.buckets.len() {
            return invalid(format!(
                "surface shows {} buckets, trial configures {}",
                surface.bucket_count(),
                config.buckets.len()
            ));
        }
        let controller = DragController::new(surface, timer, experiment)?;

        Ok(Self {
            config,
            geometry,
            arrangement,
            placements,
            rewarded,
            controller,
            finished: false,
        })
    }

    pub fn config(&self) -> &DragTrialConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.config.text_prompt
    }

    pub fn geometry(&self) -> &ViewportGeometry {
        &self.geometry
    }

    pub fn arrangement(&self) -> &BucketArrangement {
        &self.arrangement
    }

    pub fn rewarded(&self) -> &RewardedBucket {
        &self.rewarded
    }

    pub fn state(&self) -> DragState {
        self.controller.state()
    }

    pub fn surface(&self) -> &S {
        self.controller.surface()
    }

    pub fn draggable_rect(&self) -> Rect {
        self.controller.surface().draggable_rect()
    }

    pub fn bucket_rect(&self, bucket: usize) -> Option<Rect> {
        (bucket < self.controller.surface().bucket_count())
            .then(|| self.controller.surface().bucket_rect(bucket))
    }

    /// Samples in the attempt in progress; diagnostics only.
    pub fn sample_count(&self) -> usize {
        self.controller.sample_count()
    }

    pub fn attempt_count(&self) -> usize {
        self.controller.attempts().len()
    }

    pub fn tick(&mut self) -> usize {
        self.controller.tick()
    }

    pub fn pointer_down(&mut self, at: Point) -> PointerOutcome {
        self.controller.pointer_down(at)
    }

    pub fn pointer_move(&mut self, at: Point) -> PointerOutcome {
        self.controller.pointer_move(at)
    }

    pub fn pointer_up(&mut self) -> TrialStep {
        match self.controller.pointer_up() {
            PointerOutcome::Dropped { bucket, rt_ms } => {
                TrialStep::Finished(self.finish(Some(bucket), rt_ms))
            }
            other => TrialStep::Pending(other),
        }
    }

    /// Ends the trial without a drop, e.g. when the page is torn down mid-drag.
    /// `None` once the trial has already produced its record.
    pub fn force_finish(&mut self) -> Option<OutcomeRecord> {
        if self.finished || !self.controller.abandon() {
            return None;
        }
        let rt = self.controller.elapsed_ms();
        Some(self.finish(None, rt))
    }

    fn finish(&mut self, dropped: Option<usize>, rt: f64) -> OutcomeRecord {
        self.finished = true;
        let record = assemble(
            self.controller.attempts(),
            &self.placements,
            &self.rewarded,
            dropped,
            rt,
            std::slice::from_ref(&self.config.element),
        );
        info!(
            element = %self.config.element,
            drop_bucket = ?record.drop_bucket,
            correct = record.correct_bucket_index,
            is_correct = record.is_correct,
            attempts = record.drag_data.len(),
            rt = record.rt,
            "drag trial finished"
        );
        record
    }
}
