use serde::{Deserialize, Serialize};

/// A drop target. `name` is the caption shown under the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub image: String,
    pub name: String,
}

impl Bucket {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
        }
    }
}

/// An item the participant sorts, with the bucket its latent state is rewarded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    pub image: String,
    pub correct_action: usize,
}

impl Relic {
    pub fn new(image: impl Into<String>, correct_action: usize) -> Self {
        Self {
            image: image.into(),
            correct_action,
        }
    }
}
