use serde::{Deserialize, Serialize};

/// Drag gesture state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
    /// Released outside every bucket; the draggable is back home and may be grabbed again.
    Returned,
    Dropped,
    /// Torn down before a drop.
    Abandoned,
}

impl DragState {
    pub fn accepts_grab(&self) -> bool {
        matches!(self, Self::Idle | Self::Returned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dropped | Self::Abandoned)
    }
}

/// Position of the draggable's center, sampled while it is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragSample {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the trial started.
    pub time: f64,
}

/// Per-bucket presentation entry. Indexed by semantic bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRecord {
    pub name: String,
    /// Physical slot the bucket was shown in.
    pub position: usize,
    pub x: f64,
    pub y: f64,
    pub dropped: bool,
}

/// The single record a drag trial hands to the data pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub drag_data: Vec<Vec<DragSample>>,
    pub buckets: Vec<BucketRecord>,
    pub drop_bucket: Option<usize>,
    pub correct_bucket_index: usize,
    pub is_correct: bool,
    pub stimuli: Vec<String>,
    pub rt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_probs: Option<Vec<f64>>,
}

impl OutcomeRecord {
    pub fn attempt_count(&self) -> usize {
        self.drag_data.len()
    }

    pub fn sample_count(&self) -> usize {
        self.drag_data.iter().map(Vec::len).sum()
    }
}
