use lsl_core::{BucketRecord, DragSample, OutcomeRecord};

use crate::layout::BucketArrangement;

/// Where a bucket was shown, before anything was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPlacement {
    pub name: String,
    pub position: usize,
    /// Top-left corner of the bucket.
    pub x: f64,
    pub y: f64,
}

impl BucketPlacement {
    /// One placement per semantic bucket, named by `names[bucket]`.
    pub fn from_arrangement(arrangement: &BucketArrangement, names: &[String]) -> Vec<Self> {
        (0..arrangement.bucket_count())
            .filter_map(|bucket| {
                let position = arrangement.slot_of(bucket)?;
                let rect = arrangement.bucket_rect(bucket)?;
                Some(Self {
                    name: names.get(bucket).cloned().unwrap_or_default(),
                    position,
                    x: rect.left,
                    y: rect.top,
                })
            })
            .collect()
    }
}

/// The bucket that pays out on this trial.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardedBucket {
    pub index: usize,
    /// Distribution `index` was drawn from, when it was drawn.
    pub probabilities: Option<Vec<f64>>,
}

/// Packages everything a finished drag trial produced. Pure: same inputs, same record.
pub fn assemble(
    attempts: &[Vec<DragSample>],
    placements: &[BucketPlacement],
    rewarded: &RewardedBucket,
    dropped: Option<usize>,
    rt: f64,
    stimuli: &[String],
) -> OutcomeRecord {
    let buckets = placements
        .iter()
        .enumerate()
        .map(|(i, p)| BucketRecord {
            name: p.name.clone(),
            position: p.position,
            x: p.x,
            y: p.y,
            dropped: dropped == Some(i),
        })
        .collect();

    OutcomeRecord {
        drag_data: attempts.to_vec(),
        buckets,
        drop_bucket: dropped,
        correct_bucket_index: rewarded.index,
        is_correct: dropped == Some(rewarded.index),
        stimuli: stimuli.to_vec(),
        rt,
        bucket_probs: rewarded.probabilities.clone(),
    }
}
