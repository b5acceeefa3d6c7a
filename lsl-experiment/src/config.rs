use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ExpResult, invalid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Period of the drag position sampler.
    pub sampling_interval_ms: u64,
    /// Length of the cosmetic slide back home after a missed drop.
    pub return_transition_ms: u64,
    /// Weight given to a relic's intended bucket when building its reward distribution.
    pub reward_probability: f64,
    pub layout: LayoutConfig,
}

/// Sizes derived from the viewport, see `ViewportGeometry::compute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Space kept free below the arena for the text prompt.
    pub bottom_margin: f64,
    pub draggable_size_ratio: f64,
    pub droppable_size_ratio: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 10,
            return_transition_ms: 500,
            reward_probability: 1.0,
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bottom_margin: 120.0,
            draggable_size_ratio: 0.16,
            droppable_size_ratio: 0.16,
        }
    }
}

impl ExperimentConfig {
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms)
    }

    pub fn validate(&self) -> ExpResult<()> {
        if self.sampling_interval_ms == 0 {
            return invalid("sampling interval must be at least 1 ms");
        }
        if !(self.reward_probability > 0.0 && self.reward_probability <= 1.0) {
            return invalid(format!(
                "reward probability {} outside (0, 1]",
                self.reward_probability
            ));
        }
        self.layout.validate()
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> ExpResult<()> {
        for (name, ratio) in [
            ("draggable", self.draggable_size_ratio),
            ("droppable", self.droppable_size_ratio),
        ] {
            if !(ratio > 0.0 && ratio < 1.0) {
                return invalid(format!("{name} size ratio {ratio} outside (0, 1)"));
            }
        }
        if !(self.bottom_margin >= 0.0) {
            return invalid("bottom margin must be non-negative");
        }
        Ok(())
    }
}
