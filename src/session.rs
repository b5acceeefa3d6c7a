use std::io::Write;

use anyhow::{anyhow, Result};
use lsl_core::{OutcomeRecord, Phase, SessionPhase};
use lsl_experiment::{
    shuffle, upload_value, DragTrial, ExperimentConfig, StateAllocation, StateEstimate, Viewport,
};
use lsl_timing::Timer;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::participant::SimulatedParticipant;
use crate::plan::{BlockPlan, SessionPlan, TrialTemplate};

/// One line of session output.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRow {
    pub phase: SessionPhase,
    pub context: usize,
    pub trial_index: usize,
    pub correct_action: usize,
    #[serde(flatten)]
    pub estimate: Option<StateEstimate>,
    /// Whether a reward was shown; absent where feedback is withheld.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewarded: Option<bool>,
    #[serde(flatten)]
    pub outcome: OutcomeRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub correct: usize,
    pub missed_releases: usize,
    pub abandoned: usize,
    pub new_states: usize,
}

pub struct Session<T: Timer, R: Rng> {
    plan: SessionPlan,
    experiment: ExperimentConfig,
    viewport: Viewport,
    states: StateAllocation,
    participant: SimulatedParticipant,
    timer: T,
    rng: R,
}

impl<T: Timer, R: Rng> Session<T, R> {
    pub fn new(
        plan: SessionPlan,
        experiment: ExperimentConfig,
        viewport: Viewport,
        participant: SimulatedParticipant,
        timer: T,
        rng: R,
    ) -> Self {
        let states = StateAllocation::new(plan.state_names.clone());
        Self {
            plan,
            experiment,
            viewport,
            states,
            participant,
            timer,
            rng,
        }
    }

    pub fn states(&self) -> &StateAllocation {
        &self.states
    }

    /// Runs every phase in order, writing one JSON line per sorting trial.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<SessionSummary> {
        self.experiment.validate()?;
        self.plan.validate()?;

        let mut summary = SessionSummary::default();
        let mut phase = SessionPhase::default();
        loop {
            info!(?phase, "phase started");
            if let (true, Some(context)) = (phase.is_recall(), phase.context()) {
                let sources = self.plan.recall_sources.clone();
                self.states.combine(context, &sources)?;
                info!(
                    context,
                    names = ?self.states.assigned(context)?,
                    "recall uses the names learned so far"
                );
            }
            if let Some(block) = self.plan.block(phase).cloned() {
                self.run_block(phase, &block, out, &mut summary)?;
            }
            match phase.next() {
                Some(next) => phase = next,
                None => break,
            }
        }

        out.flush()?;
        info!(
            trials = summary.trials,
            correct = summary.correct,
            missed_releases = summary.missed_releases,
            abandoned = summary.abandoned,
            new_states = summary.new_states,
            "session complete"
        );
        Ok(summary)
    }

    fn run_block<W: Write>(
        &mut self,
        phase: SessionPhase,
        block: &BlockPlan,
        out: &mut W,
        summary: &mut SessionSummary,
    ) -> Result<()> {
        let context = phase
            .context()
            .ok_or_else(|| anyhow!("{phase:?} has no sorting trials"))?;

        let mut order: Vec<TrialTemplate> = Vec::with_capacity(block.trials.len() * block.repetitions);
        for _ in 0..block.repetitions {
            order.extend_from_slice(&block.trials);
        }
        if block.randomize_order {
            order = shuffle(&order, &mut self.rng).display_order;
        }

        for (trial_index, template) in order.iter().enumerate() {
            let estimate = self.estimate_state(phase, context, template)?;
            let config = template.drag_config(self.experiment.reward_probability)?;

            let mut trial = DragTrial::setup(
                config,
                self.viewport,
                &self.experiment,
                self.timer.clone(),
                &mut self.rng,
            )?;
            let outcome = self.participant.sort(
                &mut trial,
                &self.timer,
                template.relic.correct_action,
                &mut self.rng,
            )?;

            let rewarded = phase.gives_feedback().then_some(outcome.is_correct);
            match rewarded {
                Some(true) => info!(relic = %template.relic.image, "reward shown"),
                Some(false) => info!(relic = %template.relic.image, "no reward"),
                None => debug!(relic = %template.relic.image, "feedback withheld"),
            }

            summary.trials += 1;
            summary.correct += usize::from(outcome.is_correct);
            summary.missed_releases += outcome
                .attempt_count()
                .saturating_sub(usize::from(outcome.drop_bucket.is_some()));
            summary.abandoned += usize::from(outcome.drop_bucket.is_none());
            summary.new_states += usize::from(estimate.as_ref().is_some_and(|e| e.new_state));

            let row = TrialRow {
                phase,
                context,
                trial_index,
                correct_action: template.relic.correct_action,
                estimate,
                rewarded,
                outcome,
            };
            serde_json::to_writer(&mut *out, &upload_value(&row)?)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn estimate_state(
        &mut self,
        phase: SessionPhase,
        context: usize,
        template: &TrialTemplate,
    ) -> Result<Option<StateEstimate>> {
        let offer = phase
            .offers_new_state()
            .then_some(self.plan.new_state_label.as_str());
        let choices = self.states.present_choices(context, offer, &mut self.rng)?;
        let Some(response) =
            self.participant
                .choose_state(context, &template.relic, &choices, &mut self.rng)
        else {
            return Ok(None);
        };
        let estimate = self.states.resolve(&choices, response)?;
        self.participant.remember(context, &template.relic, &estimate);
        debug!(
            context,
            state = %estimate.estimated_state,
            new_state = estimate.new_state,
            "state estimated"
        );
        Ok(Some(estimate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsl_timing::ManualTimer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::Value;

    fn run(seed: u64, miss_rate: f64) -> (SessionSummary, Vec<Value>, StateAllocation) {
        let mut session = Session::new(
            SessionPlan::default(),
            ExperimentConfig::default(),
            Viewport::new(1280.0, 800.0),
            SimulatedParticipant::new(miss_rate),
            ManualTimer::new(),
            StdRng::seed_from_u64(seed),
        );
        let mut out = Vec::new();
        let summary = session.run(&mut out).unwrap();
        let rows = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, rows, session.states().clone())
    }

    #[test]
    fn careful_participant_is_always_rewarded() {
        let (summary, rows, _) = run(11, 0.0);
        assert_eq!(summary.trials, SessionPlan::default().trial_count());
        assert_eq!(rows.len(), summary.trials);
        assert_eq!(summary.correct, summary.trials);
        assert_eq!(summary.missed_releases, 0);
        assert_eq!(summary.abandoned, 0);
    }

    #[test]
    fn rows_are_flattened_for_upload() {
        let (_, rows, _) = run(3, 0.0);
        let row = &rows[0];
        assert_eq!(row["phase"], "tutorial");
        assert!(row["drag_data"]["0"].is_array());
        assert!(row["buckets"]["0"]["name"].is_string());
        assert!(row["stimuli"]["0"].is_string());
        assert!(row["bucket_probs"].is_object());
    }

    #[test]
    fn recall_reuses_names_and_withholds_feedback() {
        let (summary, rows, states) = run(5, 0.0);
        // Four tutorial relics plus two groups in each context.
        assert_eq!(summary.new_states, 8);
        assert_eq!(states.assigned(3).unwrap().len(), 4);

        let recall: Vec<&Value> = rows.iter().filter(|r| r["phase"] == "recall").collect();
        assert_eq!(recall.len(), 8);
        for row in recall {
            assert_eq!(row["new_state"], false);
            assert!(row.get("rewarded").is_none());
        }
        let context_one = rows.iter().find(|r| r["phase"] == "context_one").unwrap();
        assert!(context_one["rewarded"].is_boolean());
    }

    #[test]
    fn misses_are_retried_and_counted() {
        let (summary, rows, _) = run(8, 0.5);
        assert!(summary.missed_releases > 0);
        let retried = rows
            .iter()
            .filter(|r| r["drag_data"].as_object().is_some_and(|d| d.len() > 1))
            .count();
        assert!(retried > 0);
    }

    #[test]
    fn same_seed_same_session() {
        let (_, a, _) = run(21, 0.3);
        let (_, b, _) = run(21, 0.3);
        assert_eq!(a, b);
    }
}
