use std::path::Path;

use anyhow::{Context, Result};
use lsl_core::{Bucket, Phase, Relic, SessionPhase};
use lsl_experiment::{build_distribution, Correctness, DragTrialConfig};
use serde::{Deserialize, Serialize};

/// One relic shown against one set of buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTemplate {
    pub relic: Relic,
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub bucket_start_angle: f64,
}

/// The sorting trials of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockPlan {
    pub phase: SessionPhase,
    pub trials: Vec<TrialTemplate>,
    #[serde(default = "one")]
    pub repetitions: usize,
    #[serde(default)]
    pub randomize_order: bool,
}

fn one() -> usize {
    1
}

fn default_new_state_label() -> String {
    "Assign new relic name".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    /// Candidate latent-state names, indexed by phase context.
    pub state_names: Vec<Vec<String>>,
    #[serde(default = "default_new_state_label")]
    pub new_state_label: String,
    /// Contexts whose assigned names the recall context takes over.
    #[serde(default)]
    pub recall_sources: Vec<usize>,
    pub blocks: Vec<BlockPlan>,
}

impl SessionPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session plan {}", path.display()))?;
        let plan: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing session plan {}", path.display()))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<()> {
        for block in &self.blocks {
            let Some(context) = block.phase.context() else {
                anyhow::bail!("{:?} has no sorting trials", block.phase);
            };
            if context >= self.state_names.len() {
                anyhow::bail!("{:?} uses context {context} without a state-name table", block.phase);
            }
            for t in &block.trials {
                if t.relic.correct_action >= t.buckets.len() {
                    anyhow::bail!(
                        "{} belongs in bucket {} but only {} are shown",
                        t.relic.image,
                        t.relic.correct_action,
                        t.buckets.len()
                    );
                }
            }
        }
        Ok(())
    }

    pub fn block(&self, phase: SessionPhase) -> Option<&BlockPlan> {
        self.blocks.iter().find(|b| b.phase == phase)
    }

    pub fn trial_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.trials.len() * b.repetitions)
            .sum()
    }
}

impl TrialTemplate {
    /// Drag configuration rewarding the relic's bucket with `reward_probability`.
    pub fn drag_config(&self, reward_probability: f64) -> Result<DragTrialConfig> {
        let weights =
            build_distribution(self.relic.correct_action, reward_probability, self.buckets.len())?;
        let target = &self.buckets[self.relic.correct_action];
        Ok(DragTrialConfig {
            element: self.relic.image.clone(),
            buckets: self.buckets.clone(),
            text_prompt: format!("Drag the relic into a basket. It may belong to {}.", target.name),
            randomize_bucket_order: false,
            bucket_start_angle: self.bucket_start_angle,
            correctness: Correctness::Probabilistic(weights),
        })
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn tutorial_bags() -> Vec<Bucket> {
    (1..=4)
        .map(|i| {
            Bucket::new(
                format!("images/tutorial/buckets/tutorial_basket-{i}.png"),
                format!("Bag {i}"),
            )
        })
        .collect()
}

fn baskets() -> Vec<Bucket> {
    [
        ("green", "Emerald Vault"),
        ("blue", "Azure Haven"),
        ("red", "Crimson Nook"),
        ("yellow", "Golden Repository"),
    ]
    .into_iter()
    .map(|(color, name)| {
        Bucket::new(format!("images/baskets/basket-{color}.png"), name)
    })
    .collect()
}

fn animal(n: usize, action: usize) -> Relic {
    Relic::new(format!("images/stimulus/animal_{n}.png"), action)
}

impl Default for SessionPlan {
    /// Tutorial with one to four bags, two two-basket contexts and a four-basket recall.
    fn default() -> Self {
        let bags = tutorial_bags();
        let baskets = baskets();

        let tutorial = [0.0, 0.0, 30.0, 45.0]
            .into_iter()
            .enumerate()
            .map(|(i, angle)| TrialTemplate {
                relic: Relic::new(
                    format!("images/tutorial/stimulus/tutorial_treasures-{}.png", i + 1),
                    i,
                ),
                buckets: bags[..=i].to_vec(),
                bucket_start_angle: angle,
            })
            .collect();

        let context = |animals: &[(usize, usize)], buckets: &[Bucket], angle: f64| {
            animals
                .iter()
                .map(|&(n, action)| TrialTemplate {
                    relic: animal(n, action),
                    buckets: buckets.to_vec(),
                    bucket_start_angle: angle,
                })
                .collect::<Vec<_>>()
        };

        Self {
            state_names: vec![
                names(&["Arcane Crystals", "Ethereal Blossoms", "Draconic Scales", "Lunar Pearls"]),
                names(&[
                    "Quixot", "Wyvern", "Eronimo", "Rochar", "Tynix", "Yrton", "Urono", "Izor",
                    "Oronim", "Pexis", "Arctis", "Syber",
                ]),
                names(&[
                    "Dynax", "Fyxis", "Gyron", "Hyxel", "Jaltra", "Kavra", "Lyris", "Nexor",
                    "Pyloth", "Raxor", "Syntor", "Virox",
                ]),
                Vec::new(),
            ],
            new_state_label: default_new_state_label(),
            recall_sources: vec![1, 2],
            blocks: vec![
                BlockPlan {
                    phase: SessionPhase::Tutorial,
                    trials: tutorial,
                    repetitions: 1,
                    randomize_order: false,
                },
                BlockPlan {
                    phase: SessionPhase::ContextOne,
                    trials: context(&[(1, 0), (2, 0), (3, 1), (4, 1)], &baskets[..2], 0.0),
                    repetitions: 3,
                    randomize_order: true,
                },
                BlockPlan {
                    phase: SessionPhase::ContextTwo,
                    trials: context(&[(5, 0), (6, 0), (7, 1), (8, 1)], &baskets[2..], 90.0),
                    repetitions: 3,
                    randomize_order: true,
                },
                BlockPlan {
                    phase: SessionPhase::Recall,
                    trials: context(
                        &[(1, 0), (2, 0), (3, 1), (4, 1), (5, 2), (6, 2), (7, 3), (8, 3)],
                        &baskets,
                        45.0,
                    ),
                    repetitions: 1,
                    randomize_order: true,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_is_valid() {
        let plan = SessionPlan::default();
        plan.validate().unwrap();
        assert_eq!(plan.trial_count(), 4 + 12 + 12 + 8);
        assert_eq!(plan.block(SessionPhase::Tutorial).unwrap().trials[2].buckets.len(), 3);
        assert!(plan.block(SessionPhase::Debrief).is_none());
    }

    #[test]
    fn plan_survives_a_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = SessionPlan::default();
        std::fs::write(&path, serde_json::to_string_pretty(&plan).unwrap()).unwrap();
        assert_eq!(SessionPlan::load(&path).unwrap(), plan);
    }

    #[test]
    fn relic_outside_its_buckets_is_rejected() {
        let mut plan = SessionPlan::default();
        plan.blocks[1].trials[0].relic.correct_action = 2;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn drag_config_rewards_the_relics_bucket() {
        let plan = SessionPlan::default();
        let template = &plan.block(SessionPhase::ContextOne).unwrap().trials[2];
        let config = template.drag_config(0.8).unwrap();
        let Correctness::Probabilistic(weights) = &config.correctness else {
            panic!("expected a reward distribution");
        };
        assert_eq!(weights[1], 0.8);
        assert!((weights[0] - 0.2).abs() < 1e-12);
        assert_eq!(config.buckets.len(), 2);
        assert!(config.text_prompt.contains("Azure Haven"));
    }
}
