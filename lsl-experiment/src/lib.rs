pub mod config;
pub mod drag;
pub mod error;
pub mod export;
pub mod layout;
pub mod result;
pub mod reward;
pub mod shuffle;
pub mod state;
pub mod trial;

pub use config::{ExperimentConfig, LayoutConfig};
pub use drag::{DragController, DragSurface, PointerOutcome, SceneSurface, corner_overlap, find_drop_bucket};
pub use error::{ExpResult, ExperimentError};
pub use export::{flatten_for_upload, upload_value};
pub use layout::{BucketArrangement, Viewport, ViewportGeometry, arrange_buckets, radial_layout};
pub use result::{BucketPlacement, RewardedBucket, assemble};
pub use reward::{build_distribution, find_max_index, sample_index};
pub use shuffle::{Shuffled, shuffle};
pub use state::{StateAllocation, StateChoices, StateEstimate};
pub use trial::{Correctness, DragTrial, DragTrialConfig, TrialStep};
