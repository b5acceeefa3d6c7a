//! A scripted participant that answers state-estimation prompts and drags relics.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use lsl_core::{OutcomeRecord, Relic};
use lsl_experiment::{DragSurface, DragTrial, PointerOutcome, StateChoices, StateEstimate, TrialStep};
use lsl_timing::Timer;
use rand::Rng;
use tracing::{debug, warn};

/// Releases after this many misses end the trial without a drop.
const MAX_ATTEMPTS: usize = 10;
/// Fraction of the way to the bucket a missed release travels.
const MISS_REACH: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct SimulatedParticipant {
    miss_rate: f64,
    move_steps: usize,
    move_interval: Duration,
    by_relic: HashMap<String, String>,
    by_group: HashMap<(usize, usize), String>,
}

impl SimulatedParticipant {
    pub fn new(miss_rate: f64) -> Self {
        Self {
            miss_rate: miss_rate.clamp(0.0, 1.0),
            move_steps: 12,
            move_interval: Duration::from_millis(16),
            by_relic: HashMap::new(),
            by_group: HashMap::new(),
        }
    }

    /// Button to press, or `None` when nothing is offered. Relics seen before keep
    /// their name; relics sharing a bucket within a context share one too.
    pub fn choose_state<R: Rng + ?Sized>(
        &self,
        context: usize,
        relic: &Relic,
        choices: &StateChoices,
        rng: &mut R,
    ) -> Option<usize> {
        if choices.is_empty() {
            return None;
        }
        let known = self
            .by_relic
            .get(&relic.image)
            .or_else(|| self.by_group.get(&(context, relic.correct_action)));
        if let Some(pos) = known.and_then(|name| choices.position_of(name)) {
            return Some(pos);
        }
        choices
            .new_option_index()
            .or_else(|| Some(rng.random_range(0..choices.len())))
    }

    pub fn remember(&mut self, context: usize, relic: &Relic, estimate: &StateEstimate) {
        self.by_relic
            .insert(relic.image.clone(), estimate.estimated_state.clone());
        self.by_group
            .entry((context, relic.correct_action))
            .or_insert_with(|| estimate.estimated_state.clone());
    }

    /// Drags the relic toward `target` until it lands, sometimes letting go short of it.
    pub fn sort<S, T, R>(
        &self,
        trial: &mut DragTrial<S, T>,
        timer: &T,
        target: usize,
        rng: &mut R,
    ) -> Result<OutcomeRecord>
    where
        S: DragSurface,
        T: Timer,
        R: Rng + ?Sized,
    {
        let bucket = trial
            .bucket_rect(target)
            .ok_or_else(|| anyhow!("no bucket {target} on screen"))?;
        let nudge = bucket.width() / 4.0;
        let on_target = bucket.center().offset_by(nudge, nudge);

        for attempt in 0..MAX_ATTEMPTS {
            let start = trial.draggable_rect().center();
            let release = if rng.random::<f64>() < self.miss_rate {
                start.lerp(bucket.center(), MISS_REACH)
            } else {
                on_target
            };

            if trial.pointer_down(start) != PointerOutcome::Grabbed {
                return Err(anyhow!("relic refused the grab on attempt {attempt}"));
            }
            for step in 1..=self.move_steps {
                let jitter = Duration::from_micros(rng.random_range(0..4_000));
                timer.sleep(self.move_interval + jitter);
                let t = step as f64 / self.move_steps as f64;
                trial.pointer_move(start.lerp(release, t));
            }
            match trial.pointer_up() {
                TrialStep::Finished(record) => return Ok(record),
                TrialStep::Pending(outcome) => debug!(attempt, ?outcome, "relic came back"),
            }
        }

        warn!(target, "gave up after {MAX_ATTEMPTS} releases");
        trial
            .force_finish()
            .ok_or_else(|| anyhow!("trial ended twice"))
    }
}
