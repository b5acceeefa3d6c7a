pub mod bucket;
pub mod geometry;
pub mod phase;
pub mod trial;

pub use bucket::{Bucket, Relic};
pub use geometry::{Point, Rect};
pub use phase::{Phase, SessionPhase};
pub use trial::{BucketRecord, DragSample, DragState, OutcomeRecord};
