pub mod sampler;
pub mod timer;

pub use sampler::{IntervalSampler, SamplerStats};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
